//
// Copyright (c) The Meshsim Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;

use meshsim_packet::lsa::{Destination, ReachabilityEntry};

use crate::lsdb::Lsdb;
use crate::route::{Route, RoutingTable};

// A node of the topology graph with its tentative shortest-path state: the
// distance from the computing router and the hops of the path, each hop
// labeled with the outgoing interface of the router that advertised it.
#[derive(Debug)]
struct Vertex {
    distance: u32,
    path: Vec<(Destination, String)>,
}

// ===== global functions =====

// Compute shortest paths over the LSDB and derive the forwarding table.
//
// The LSDB is treated as a directed weighted graph: every advertising
// router contributes its reachability list as outgoing edges. Destinations
// that never advertise anything themselves (attached subnets) appear as
// leaf nodes. The forwarding entry for each reachable node is the interface
// of the first hop on its shortest path.
pub(crate) fn compute(router_id: Ipv4Addr, lsdb: &Lsdb) -> RoutingTable {
    let root = Destination::Host(router_id);

    // Build the adjacency map from the LSDB.
    let mut graph: BTreeMap<Destination, Vec<ReachabilityEntry>> =
        BTreeMap::new();
    for (adv_rtr, entries) in lsdb.iter() {
        let node = Destination::Host(*adv_rtr);
        graph.entry(node).or_default().extend(entries.iter().cloned());
        for entry in entries {
            graph.entry(entry.dest).or_default();
        }
    }

    // Initialize the root and its direct neighbors.
    let mut settled = BTreeSet::from([root]);
    let mut vertices: BTreeMap<Destination, Vertex> = BTreeMap::new();
    vertices.insert(
        root,
        Vertex {
            distance: 0,
            path: Vec::new(),
        },
    );
    if let Some(entries) = graph.get(&root) {
        for entry in entries {
            vertices.insert(
                entry.dest,
                Vertex {
                    distance: entry.cost,
                    path: vec![(entry.dest, entry.iface.clone())],
                },
            );
        }
    }

    // Dijkstra: settle the closest tentative vertex and relax its edges.
    // Ties are broken by map iteration order, which is stable.
    while settled.len() < graph.len() {
        let closest = vertices
            .iter()
            .filter(|(node, _)| !settled.contains(*node))
            .min_by_key(|(_, vertex)| vertex.distance)
            .map(|(node, vertex)| (*node, vertex.distance));
        let Some((node, distance)) = closest else {
            // The remaining nodes are unreachable.
            break;
        };
        settled.insert(node);

        let path = vertices[&node].path.clone();
        for entry in graph.get(&node).into_iter().flatten() {
            if settled.contains(&entry.dest) {
                continue;
            }

            let new_distance = distance + entry.cost;
            let improved = vertices
                .get(&entry.dest)
                .is_none_or(|vertex| new_distance < vertex.distance);
            if improved {
                let mut new_path = path.clone();
                new_path.push((entry.dest, entry.iface.clone()));
                vertices.insert(
                    entry.dest,
                    Vertex {
                        distance: new_distance,
                        path: new_path,
                    },
                );
            }
        }
    }

    // Derive the forwarding table: first-hop interface and total cost for
    // every node with a computed path.
    let mut table = RoutingTable::default();
    for (node, vertex) in &vertices {
        if let Some((_, first_hop_iface)) = vertex.path.first() {
            table.insert(
                *node,
                Route::new(first_hop_iface.clone(), vertex.distance),
            );
        }
    }

    table
}

// ===== tests =====

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn entry(dest: &str, cost: u32, iface: &str) -> ReachabilityEntry {
        ReachabilityEntry::new(dest.parse().unwrap(), cost, iface.to_owned())
    }

    fn rtr(n: u8) -> Ipv4Addr {
        Ipv4Addr::new(n, n, n, n)
    }

    // R1 <-Gi0/2 / Gi0/1-> R2, cost 3, one attached subnet each.
    fn two_router_lsdb(router_id: Ipv4Addr) -> Lsdb {
        let r1_entries = vec![
            entry("127.0.0.0/24", 0, "Gi0/1"),
            entry("2.2.2.2", 3, "Gi0/2"),
        ];
        let r2_entries = vec![
            entry("127.128.0.0/24", 0, "Gi0/2"),
            entry("1.1.1.1", 3, "Gi0/1"),
        ];

        let mut lsdb = if router_id == rtr(1) {
            Lsdb::new(rtr(1), &r1_entries)
        } else {
            Lsdb::new(rtr(2), &r2_entries)
        };
        let r1_lsa = meshsim_packet::lsa::LsaPdu::new(
            Ipv4Addr::new(127, 248, 0, 1),
            rtr(1),
            0,
            r1_entries,
        );
        let r2_lsa = meshsim_packet::lsa::LsaPdu::new(
            Ipv4Addr::new(127, 248, 0, 2),
            rtr(2),
            0,
            r2_entries,
        );
        lsdb.install(router_id, &r1_lsa);
        lsdb.install(router_id, &r2_lsa);
        lsdb
    }

    #[test]
    fn two_router_mesh() {
        let table = compute(rtr(1), &two_router_lsdb(rtr(1)));

        // R1 reaches R2 and R2's attached subnet through Gi0/2.
        let route = table.get(&"2.2.2.2".parse().unwrap()).unwrap();
        assert_eq!(*route, Route::new("Gi0/2".to_owned(), 3));
        let route = table.get(&"127.128.0.0/24".parse().unwrap()).unwrap();
        assert_eq!(*route, Route::new("Gi0/2".to_owned(), 3));

        // R1's own subnet is a cost-0 direct connection.
        let route = table.get(&"127.0.0.0/24".parse().unwrap()).unwrap();
        assert_eq!(*route, Route::new("Gi0/1".to_owned(), 0));

        // Symmetric on R2.
        let table = compute(rtr(2), &two_router_lsdb(rtr(2)));
        let route = table.get(&"1.1.1.1".parse().unwrap()).unwrap();
        assert_eq!(*route, Route::new("Gi0/1".to_owned(), 3));
        let route = table.get(&"127.0.0.0/24".parse().unwrap()).unwrap();
        assert_eq!(*route, Route::new("Gi0/1".to_owned(), 3));
    }

    // The six-router sample topology.
    fn six_router_lsdb(router_id: Ipv4Addr) -> Lsdb {
        let all: Vec<(Ipv4Addr, Vec<ReachabilityEntry>)> = vec![
            (
                rtr(1),
                vec![
                    entry("127.0.0.0/24", 0, "Gi0/1"),
                    entry("2.2.2.2", 3, "Gi0/2"),
                    entry("3.3.3.3", 9, "Gi0/3"),
                ],
            ),
            (
                rtr(2),
                vec![
                    entry("127.30.0.0/24", 0, "Gi0/2"),
                    entry("1.1.1.1", 3, "Gi0/1"),
                    entry("3.3.3.3", 5, "Gi0/4"),
                    entry("4.4.4.4", 12, "Gi0/3"),
                ],
            ),
            (
                rtr(3),
                vec![
                    entry("127.10.0.0/24", 0, "Gi0/4"),
                    entry("1.1.1.1", 9, "Gi0/1"),
                    entry("2.2.2.2", 5, "Gi0/2"),
                    entry("5.5.5.5", 10, "Gi0/3"),
                ],
            ),
            (
                rtr(4),
                vec![
                    entry("127.40.0.0/24", 0, "Gi0/2"),
                    entry("2.2.2.2", 12, "Gi0/1"),
                    entry("5.5.5.5", 4, "Gi0/4"),
                    entry("6.6.6.6", 10, "Gi0/3"),
                ],
            ),
            (
                rtr(5),
                vec![
                    entry("127.20.0.0/24", 0, "Gi0/4"),
                    entry("3.3.3.3", 10, "Gi0/1"),
                    entry("4.4.4.4", 4, "Gi0/2"),
                    entry("6.6.6.6", 5, "Gi0/3"),
                ],
            ),
            (
                rtr(6),
                vec![
                    entry("127.128.0.0/24", 0, "Gi0/3"),
                    entry("4.4.4.4", 10, "Gi0/1"),
                    entry("5.5.5.5", 5, "Gi0/2"),
                ],
            ),
        ];

        let own = all
            .iter()
            .find(|(adv_rtr, _)| *adv_rtr == router_id)
            .unwrap();
        let mut lsdb = Lsdb::new(router_id, &own.1);
        for (adv_rtr, entries) in &all {
            let lsa = meshsim_packet::lsa::LsaPdu::new(
                Ipv4Addr::new(127, 248, 0, 1),
                *adv_rtr,
                0,
                entries.clone(),
            );
            lsdb.install(router_id, &lsa);
        }
        lsdb
    }

    #[test]
    fn six_router_costs_from_r1() {
        let table = compute(rtr(1), &six_router_lsdb(rtr(1)));

        // Reference shortest-path costs from R1. The direct R1-R3 link
        // (cost 9) loses to the two-hop path through R2 (3 + 5).
        for (dest, cost) in [
            ("2.2.2.2", 3),
            ("3.3.3.3", 8),
            ("4.4.4.4", 15),
            ("5.5.5.5", 18),
            ("6.6.6.6", 23),
            ("127.0.0.0/24", 0),
            ("127.30.0.0/24", 3),
            ("127.10.0.0/24", 8),
            ("127.40.0.0/24", 15),
            ("127.20.0.0/24", 18),
            ("127.128.0.0/24", 23),
        ] {
            let route = table.get(&dest.parse().unwrap()).unwrap();
            assert_eq!(route.cost, cost, "cost to {}", dest);
        }

        // Everything except R1's own subnet leaves through Gi0/2 (toward
        // R2), including the server subnet behind R6.
        let route = table.get(&"127.128.0.0/24".parse().unwrap()).unwrap();
        assert_eq!(route.iface, "Gi0/2");
        let route = table.get(&"127.0.0.0/24".parse().unwrap()).unwrap();
        assert_eq!(route.iface, "Gi0/1");
    }

    #[test]
    fn table_covers_all_lsdb_destinations() {
        let lsdb = six_router_lsdb(rtr(4));
        let table = compute(rtr(4), &lsdb);

        for (adv_rtr, entries) in lsdb.iter() {
            if *adv_rtr != rtr(4) {
                assert!(
                    table.get(&Destination::Host(*adv_rtr)).is_some(),
                    "missing router {}",
                    adv_rtr
                );
            }
            for entry in entries {
                if entry.dest == Destination::Host(rtr(4)) {
                    continue;
                }
                assert!(
                    table.get(&entry.dest).is_some(),
                    "missing destination {}",
                    entry.dest
                );
            }
        }
    }
}
