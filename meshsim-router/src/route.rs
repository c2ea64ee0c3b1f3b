//
// Copyright (c) The Meshsim Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use derive_new::new;
use meshsim_packet::lsa::Destination;
use serde::Serialize;

// A forwarding-table entry: the interface of the first hop on the shortest
// path toward the destination, and the total path cost.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, new)]
pub struct Route {
    pub iface: String,
    pub cost: u32,
}

// The forwarding table derived from the LSDB by the shortest-path run.
#[derive(Debug, Default, Serialize)]
pub struct RoutingTable(BTreeMap<Destination, Route>);

// ===== impl RoutingTable =====

impl RoutingTable {
    pub(crate) fn insert(&mut self, dest: Destination, route: Route) {
        self.0.insert(dest, route);
    }

    pub fn get(&self, dest: &Destination) -> Option<&Route> {
        self.0.get(dest)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Destination, &Route)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    // Longest-prefix match of the given destination address.
    //
    // Every entry scores the number of leading bits it shares with the
    // address, capped at its declared prefix length (bare hosts count as
    // /32). The highest score wins; ties go to the longer declared prefix,
    // then to the first entry in table order.
    pub fn longest_prefix_match(
        &self,
        addr: Ipv4Addr,
    ) -> Option<(&Destination, &Route)> {
        let addr_bits = u32::from(addr);

        let mut best: Option<(u32, u8, &Destination, &Route)> = None;
        for (dest, route) in &self.0 {
            let (dest_bits, prefix_len) = match dest {
                Destination::Prefix(prefix) => {
                    (u32::from(prefix.ip()), prefix.prefix())
                }
                Destination::Host(host) => (u32::from(*host), 32),
            };
            let matching = (addr_bits ^ dest_bits)
                .leading_zeros()
                .min(prefix_len as u32);

            if let Some((best_matching, best_prefix_len, ..)) = best
                && (matching, prefix_len) <= (best_matching, best_prefix_len)
            {
                continue;
            }
            best = Some((matching, prefix_len, dest, route));
        }

        best.map(|(_, _, dest, route)| (dest, route))
    }
}

// ===== tests =====

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, &str)]) -> RoutingTable {
        let mut table = RoutingTable::default();
        for (dest, iface) in entries {
            table.insert(dest.parse().unwrap(), Route::new((*iface).to_owned(), 1));
        }
        table
    }

    #[test]
    fn lpm_prefers_longer_match() {
        let table = table(&[
            ("127.0.0.0/24", "Gi0/1"),
            ("127.128.0.0/24", "Gi0/2"),
            ("127.248.0.0/16", "Gi0/3"),
        ]);

        let (dest, route) = table
            .longest_prefix_match(Ipv4Addr::new(127, 128, 0, 1))
            .unwrap();
        assert_eq!(dest, &"127.128.0.0/24".parse().unwrap());
        assert_eq!(route.iface, "Gi0/2");
    }

    #[test]
    fn lpm_host_beats_covering_prefix() {
        let table = table(&[
            ("127.128.0.0/24", "Gi0/1"),
            ("127.128.0.1", "Gi0/2"),
        ]);

        // Exact host match scores 32 and wins over the /24.
        let (_, route) = table
            .longest_prefix_match(Ipv4Addr::new(127, 128, 0, 1))
            .unwrap();
        assert_eq!(route.iface, "Gi0/2");

        // Any other address in the subnet still routes via the prefix.
        let (_, route) = table
            .longest_prefix_match(Ipv4Addr::new(127, 128, 0, 7))
            .unwrap();
        assert_eq!(route.iface, "Gi0/1");
    }

    #[test]
    fn lpm_tie_breaks_on_declared_length() {
        // Both entries share the same 8 leading bits with the address; the
        // longer declared prefix wins the tie.
        let table = table(&[("127.0.0.0/8", "Gi0/1"), ("127.0.0.0/16", "Gi0/2")]);

        let (_, route) = table
            .longest_prefix_match(Ipv4Addr::new(127, 200, 2, 3))
            .unwrap();
        assert_eq!(route.iface, "Gi0/2");
    }

    #[test]
    fn lpm_empty_table() {
        let table = RoutingTable::default();
        assert!(table.longest_prefix_match(Ipv4Addr::new(127, 0, 0, 1)).is_none());
    }
}
