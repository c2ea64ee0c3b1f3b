//
// Copyright (c) The Meshsim Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;

use meshsim_packet::Datagram;
use meshsim_packet::lsa::{LsaPdu, ReachabilityEntry};
use meshsim_packet::segment::Segment;

use crate::debug::Debug;
use crate::interface::{Interface, Interfaces};
use crate::network;

// ===== global functions =====

// Advertise the router's own reachability list on every interface.
pub(crate) async fn send_initial_lsa(
    interfaces: &Interfaces,
    router_id: Ipv4Addr,
    seq_no: u16,
    entries: &[ReachabilityEntry],
) {
    for iface in interfaces.iter() {
        let pdu =
            LsaPdu::new(iface.local, router_id, seq_no, entries.to_vec());

        Debug::LsaTx(&iface.name, &pdu).log();
        if let Err(error) = network::send_datagram(
            &iface.socket,
            iface.peer,
            &Datagram::Lsa(pdu),
        )
        .await
        {
            error.log();
        }
    }
}

// Re-emit a transit segment on the chosen interface with the next-hop
// field rewritten to the neighbor on the far end.
pub(crate) async fn forward_segment(iface: &Interface, segment: &Segment) {
    let fwd_segment = Segment::new(
        segment.hdr.saddr,
        segment.hdr.daddr,
        segment.sport,
        segment.dport,
        segment.seq_num,
        segment.ack_num,
        segment.flags,
        segment.window,
        iface.peer,
        segment.payload.clone(),
    );

    Debug::SegmentFwd(&iface.name, iface.peer).log();
    if let Err(error) = network::send_datagram(
        &iface.socket,
        iface.peer,
        &Datagram::Segment(fwd_segment),
    )
    .await
    {
        error.log();
    }
}
