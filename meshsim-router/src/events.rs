//
// Copyright (c) The Meshsim Contributors
//
// SPDX-License-Identifier: MIT
//

use meshsim_packet::Datagram;
use meshsim_packet::error::DecodeError;
use meshsim_packet::lsa::LsaPdu;
use meshsim_packet::segment::Segment;
use meshsim_utils::Sender;

use crate::debug::Debug;
use crate::error::Error;
use crate::instance::{Phase, Router};
use crate::tasks::messages::ProtocolInputMsg;
use crate::{flood, output, spf, tasks};

// ===== datagram receipt =====

pub(crate) async fn process_datagram(
    router: &mut Router,
    datagram: Result<Datagram, DecodeError>,
) {
    match datagram {
        Ok(Datagram::Lsa(pdu)) if router.state.phase == Phase::Flooding => {
            process_lsa(router, pdu).await;
        }
        Ok(Datagram::Segment(segment))
            if router.state.phase == Phase::Forwarding =>
        {
            process_segment(router, segment).await;
        }
        // Datagram shapes that don't belong to the current phase are
        // ignored.
        Ok(_) => (),
        Err(error) => {
            router.state.malformed_rcvd += 1;
            Error::DatagramDecodeError(error).log();
        }
    }
}

async fn process_lsa(router: &mut Router, pdu: LsaPdu) {
    // The source must be one of this router's neighbors.
    let Some(arrival_iface) = router.interfaces.get_by_peer(pdu.hdr.saddr)
    else {
        Error::UnexpectedPeer(pdu.hdr.saddr).log();
        return;
    };
    let arrival_iface = arrival_iface.name.clone();

    Debug::LsaRx(&arrival_iface, &pdu).log();

    if !router.state.lsdb.install(router.config.router_id, &pdu) {
        Debug::LsaDiscard(&pdu).log();
        return;
    }

    // Every accepted LSA pushes the quiescence deadline out.
    if let Some(quiesce_task) = router.state.quiesce_task.as_mut() {
        quiesce_task.reset(None);
    }

    // Let the initial LSA burst settle before flooding onward.
    tokio::time::sleep(router.config.timers.flood_delay).await;
    flood::flood(&router.interfaces, Some(&arrival_iface), &pdu).await;
}

async fn process_segment(router: &Router, segment: Segment) {
    // The next-hop gate: a transit segment must name one of this router's
    // interface addresses, otherwise it is someone else's to forward.
    if !router.interfaces.contains_local(segment.next_hop) {
        Error::UnexpectedPeer(segment.next_hop).log();
        return;
    }

    let Some((_, route)) =
        router.state.table.longest_prefix_match(segment.hdr.daddr)
    else {
        Error::NoRouteToHost(segment.hdr.daddr).log();
        return;
    };

    let Some(iface) = router.interfaces.get_by_name(&route.iface) else {
        Error::InterfaceNotFound(route.iface.clone()).log();
        return;
    };

    output::forward_segment(iface, &segment).await;
}

// ===== flooding quiescence =====

pub(crate) fn process_quiescence(
    router: &mut Router,
    protocol_inputp: &Sender<ProtocolInputMsg>,
) {
    Debug::FloodingQuiesced.log();

    // Derive the forwarding table and move to the forwarding phase.
    router.state.table =
        spf::compute(router.config.router_id, &router.state.lsdb);
    Debug::SpfDone(router.state.table.len()).log();

    router.state.phase = Phase::Forwarding;
    router.state.quiesce_task = None;
    router.state.forward_timeout_task = Some(tasks::forward_timeout(
        router.config.timers.forward_timeout,
        protocol_inputp,
    ));
}
