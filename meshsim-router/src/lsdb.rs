//
// Copyright (c) The Meshsim Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use meshsim_packet::lsa::{LsaPdu, ReachabilityEntry};
use serde::Serialize;

// The Link-State Database: every router's advertised reachability list,
// keyed by advertising router, together with the highest sequence number
// accepted from each origin.
#[derive(Debug, Default, Serialize)]
pub struct Lsdb {
    entries: BTreeMap<Ipv4Addr, Vec<ReachabilityEntry>>,
    seq_nos: BTreeMap<Ipv4Addr, u16>,
}

// ===== impl Lsdb =====

impl Lsdb {
    // Seed the database with the router's own reachability list.
    pub(crate) fn new(
        router_id: Ipv4Addr,
        connections: &[ReachabilityEntry],
    ) -> Lsdb {
        let mut lsdb = Lsdb::default();
        lsdb.entries.insert(router_id, connections.to_vec());
        lsdb
    }

    // The entry this router originates itself.
    pub(crate) fn own_entry(&self, router_id: Ipv4Addr) -> &[ReachabilityEntry] {
        self.entries
            .get(&router_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    // Process a received LSA.
    //
    // An LSA is installed only when it comes from another router and its
    // sequence number is strictly higher than anything accepted from that
    // origin before. Returns whether the LSA was installed (and hence needs
    // to be flooded onward).
    pub(crate) fn install(
        &mut self,
        router_id: Ipv4Addr,
        pdu: &LsaPdu,
    ) -> bool {
        if pdu.adv_rtr == router_id {
            return false;
        }
        if let Some(seq_no) = self.seq_nos.get(&pdu.adv_rtr)
            && pdu.seq_no <= *seq_no
        {
            return false;
        }

        self.seq_nos.insert(pdu.adv_rtr, pdu.seq_no);
        self.entries.insert(pdu.adv_rtr, pdu.entries.clone());
        true
    }

    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (&Ipv4Addr, &Vec<ReachabilityEntry>)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ===== tests =====
