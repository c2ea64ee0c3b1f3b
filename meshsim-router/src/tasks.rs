//
// Copyright (c) The Meshsim Contributors
//
// SPDX-License-Identifier: MIT
//

use std::sync::Arc;
use std::time::Duration;

use meshsim_utils::Sender;
use meshsim_utils::socket::RawSocket;
use meshsim_utils::task::{Task, TimeoutTask};
use tracing::{Instrument, debug_span};

use crate::network;

//
// Router tasks diagram:
//
//                                +--------------+
//              net_rx (Nx+1) -> |              |
//         lsa_quiesce (0/1x) -> |   instance   | -> interface sockets
//     forward_timeout (0/1x) -> |              |
//                                +--------------+
//
// One net_rx task per interface socket plus one for the receive-all
// socket; the quiescence timeout drives the flooding -> forwarding phase
// transition and the forwarding timeout drives the shutdown.
//

// Router inter-task message types.
pub mod messages {
    // Type aliases.
    pub type ProtocolInputMsg = input::ProtocolMsg;

    // Input messages (child task -> main task).
    pub mod input {
        use meshsim_packet::Datagram;
        use meshsim_packet::error::DecodeError;

        #[derive(Debug)]
        pub enum ProtocolMsg {
            NetRxDatagram(NetRxDatagramMsg),
            LsaQuiesce(LsaQuiesceMsg),
            ForwardTimeout(ForwardTimeoutMsg),
        }

        #[derive(Debug)]
        pub struct NetRxDatagramMsg {
            pub datagram: Result<Datagram, DecodeError>,
        }

        #[derive(Debug)]
        pub struct LsaQuiesceMsg {}

        #[derive(Debug)]
        pub struct ForwardTimeoutMsg {}
    }
}

// ===== Router tasks =====

// Datagram Rx task.
pub(crate) fn net_rx(
    socket: Arc<RawSocket>,
    iface_name: &str,
    net_rxp: &Sender<messages::input::ProtocolMsg>,
) -> Task<()> {
    let span1 = debug_span!("network");
    let _span1_guard = span1.enter();
    let span2 = debug_span!("input", interface = %iface_name);
    let _span2_guard = span2.enter();

    let net_rxp = net_rxp.clone();

    Task::spawn_supervised(move || {
        let socket = socket.clone();
        let net_rxp = net_rxp.clone();
        async move {
            let _ = network::read_loop(socket, net_rxp).await;
        }
        .in_current_span()
    })
}

// LSA quiescence timeout task.
pub(crate) fn lsa_quiesce_timeout(
    timeout: Duration,
    lsa_quiescep: &Sender<messages::input::ProtocolMsg>,
) -> TimeoutTask {
    let lsa_quiescep = lsa_quiescep.clone();
    TimeoutTask::new(timeout, move || async move {
        let msg = messages::input::ProtocolMsg::LsaQuiesce(
            messages::input::LsaQuiesceMsg {},
        );
        let _ = lsa_quiescep.send(msg).await;
    })
}

// Forwarding-phase deadline task.
pub(crate) fn forward_timeout(
    timeout: Duration,
    forward_timeoutp: &Sender<messages::input::ProtocolMsg>,
) -> TimeoutTask {
    let forward_timeoutp = forward_timeoutp.clone();
    TimeoutTask::new(timeout, move || async move {
        let msg = messages::input::ProtocolMsg::ForwardTimeout(
            messages::input::ForwardTimeoutMsg {},
        );
        let _ = forward_timeoutp.send(msg).await;
    })
}
