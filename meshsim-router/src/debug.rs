//
// Copyright (c) The Meshsim Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;

use meshsim_packet::lsa::LsaPdu;
use tracing::{debug, debug_span, info};

use crate::lsdb::Lsdb;
use crate::route::RoutingTable;

// Router debug messages.
#[derive(Debug)]
pub enum Debug<'a> {
    InstanceCreate,
    InstanceStart,
    InstanceStop,
    LsaTx(&'a str, &'a LsaPdu),
    LsaRx(&'a str, &'a LsaPdu),
    LsaDiscard(&'a LsaPdu),
    FloodingQuiesced,
    SpfDone(usize),
    SegmentFwd(&'a str, Ipv4Addr),
    LsdbDump(&'a Lsdb),
    TableDump(&'a RoutingTable),
}

// ===== impl Debug =====

impl Debug<'_> {
    // Log debug message using the tracing API.
    pub(crate) fn log(&self) {
        match self {
            Debug::InstanceCreate
            | Debug::InstanceStart
            | Debug::InstanceStop => {
                // Parent span(s): router.
                debug!("{}", self);
            }
            Debug::LsaTx(iface, pdu) => {
                // Parent span(s): router.
                debug_span!("network").in_scope(|| {
                    debug_span!("output", interface = %iface).in_scope(|| {
                        let data = serde_json::to_string(&pdu).unwrap();
                        debug!(%data, "{}", self);
                    });
                });
            }
            Debug::LsaRx(iface, pdu) => {
                // Parent span(s): router.
                debug_span!("network").in_scope(|| {
                    debug_span!("input", interface = %iface).in_scope(|| {
                        let data = serde_json::to_string(&pdu).unwrap();
                        debug!(%data, "{}", self);
                    });
                });
            }
            Debug::LsaDiscard(pdu) => {
                // Parent span(s): router.
                debug!(adv_rtr = %pdu.adv_rtr, seq_no = %pdu.seq_no, "{}", self);
            }
            Debug::FloodingQuiesced => {
                // Parent span(s): router.
                debug!("{}", self);
            }
            Debug::SpfDone(destinations) => {
                // Parent span(s): router.
                debug!(%destinations, "{}", self);
            }
            Debug::SegmentFwd(iface, next_hop) => {
                // Parent span(s): router.
                debug_span!("network").in_scope(|| {
                    debug_span!("output", interface = %iface).in_scope(|| {
                        debug!(%next_hop, "{}", self);
                    });
                });
            }
            Debug::LsdbDump(lsdb) => {
                // Parent span(s): router.
                let data = serde_json::to_string(&lsdb).unwrap();
                info!(%data, "{}", self);
            }
            Debug::TableDump(table) => {
                // Parent span(s): router.
                let data = serde_json::to_string(&table).unwrap();
                info!(%data, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for Debug<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::InstanceCreate => {
                write!(f, "instance created")
            }
            Debug::InstanceStart => {
                write!(f, "starting instance")
            }
            Debug::InstanceStop => {
                write!(f, "stopping instance")
            }
            Debug::LsaTx(..) => {
                write!(f, "lsa tx")
            }
            Debug::LsaRx(..) => {
                write!(f, "lsa rx")
            }
            Debug::LsaDiscard(..) => {
                write!(f, "lsa discarded")
            }
            Debug::FloodingQuiesced => {
                write!(f, "flooding quiesced")
            }
            Debug::SpfDone(..) => {
                write!(f, "shortest paths computed")
            }
            Debug::SegmentFwd(..) => {
                write!(f, "segment forwarded")
            }
            Debug::LsdbDump(..) => {
                write!(f, "link-state database")
            }
            Debug::TableDump(..) => {
                write!(f, "forwarding table")
            }
        }
    }
}
