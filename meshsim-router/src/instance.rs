//
// Copyright (c) The Meshsim Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use meshsim_packet::lsa::ReachabilityEntry;
use meshsim_utils::socket::RawSocket;
use meshsim_utils::task::TimeoutTask;
use tokio::sync::mpsc;

use crate::debug::Debug;
use crate::error::{Error, IoError};
use crate::interface::{Interface, Interfaces};
use crate::lsdb::Lsdb;
use crate::route::RoutingTable;
use crate::tasks::messages::ProtocolInputMsg;
use crate::{events, output, tasks};

// Label used for the receive-all socket in log messages. The socket is not
// an interface and never shows up in the forwarding table.
const RX_SOCK_LABEL: &str = "receive";

// Router bootstrap configuration.
#[derive(Clone, Debug)]
pub struct RouterCfg {
    // Router ID in dotted-quad form.
    pub router_id: Ipv4Addr,
    // Interfaces: name -> (local address, neighbor address).
    pub interfaces: BTreeMap<String, (Ipv4Addr, Ipv4Addr)>,
    // Directly connected destinations with their link costs.
    pub connections: Vec<ReachabilityEntry>,
    // Phase timers.
    pub timers: RouterTimers,
}

// Wall-clock budgets driving the phase transitions.
#[derive(Clone, Copy, Debug)]
pub struct RouterTimers {
    // Delay before flooding an accepted LSA onward.
    pub flood_delay: Duration,
    // Silence interval after which flooding is considered complete.
    pub quiesce_interval: Duration,
    // Total budget of the forwarding phase.
    pub forward_timeout: Duration,
}

// Router operational phases.
//
// A router floods and learns topology first, then derives its forwarding
// table once and forwards application traffic until its time budget runs
// out. The two phases never overlap: no segment is forwarded before the
// first SPF run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    Flooding,
    Forwarding,
}

#[derive(Debug)]
pub struct Router {
    // Router configuration.
    pub config: RouterCfg,
    // Forwarding interfaces, each with its own raw socket.
    pub interfaces: Interfaces,
    // Receive-all socket.
    pub rx_sock: Arc<RawSocket>,
    // Router state.
    pub state: InstanceState,
}

#[derive(Debug)]
pub struct InstanceState {
    // Current phase.
    pub phase: Phase,
    // Own LSA sequence number.
    pub lsa_seq_no: u16,
    // Link-state database.
    pub lsdb: Lsdb,
    // Derived forwarding table.
    pub table: RoutingTable,
    // Quiescence timeout (flooding phase only).
    pub quiesce_task: Option<TimeoutTask>,
    // Forwarding-phase deadline.
    pub forward_timeout_task: Option<TimeoutTask>,
    // Number of datagrams dropped as malformed.
    pub malformed_rcvd: u64,
}

// ===== impl Router =====

impl Router {
    // Create the router and bind all of its sockets.
    pub fn new(config: RouterCfg) -> Result<Router, Error> {
        let mut interfaces = Interfaces::default();
        for (name, (local, peer)) in &config.interfaces {
            let iface = Interface::new(name, *local, *peer)
                .map_err(|error| {
                    Error::InterfaceStartError(name.clone(), error)
                })?;
            interfaces.insert(iface);
        }

        let rx_sock = RawSocket::bind(Ipv4Addr::UNSPECIFIED)
            .map_err(|error| Error::from(IoError::SocketError(error)))?;

        let lsdb = Lsdb::new(config.router_id, &config.connections);

        Debug::InstanceCreate.log();

        Ok(Router {
            config,
            interfaces,
            rx_sock: Arc::new(rx_sock),
            state: InstanceState {
                phase: Phase::Flooding,
                lsa_seq_no: 0,
                lsdb,
                table: RoutingTable::default(),
                quiesce_task: None,
                forward_timeout_task: None,
                malformed_rcvd: 0,
            },
        })
    }

    // Run the router until its forwarding budget expires.
    pub async fn run(mut self) {
        Debug::InstanceStart.log();

        let (protocol_inputp, mut protocol_inputc) = mpsc::channel(64);

        // Start one receive task per interface socket, plus one for the
        // receive-all socket. The handles abort the tasks when dropped at
        // the end of the run.
        let mut net_rx_tasks = Vec::new();
        for iface in self.interfaces.iter() {
            net_rx_tasks.push(tasks::net_rx(
                iface.socket.clone(),
                &iface.name,
                &protocol_inputp,
            ));
        }
        net_rx_tasks.push(tasks::net_rx(
            self.rx_sock.clone(),
            RX_SOCK_LABEL,
            &protocol_inputp,
        ));

        // Advertise the local reachability list.
        output::send_initial_lsa(
            &self.interfaces,
            self.config.router_id,
            self.state.lsa_seq_no,
            self.state.lsdb.own_entry(self.config.router_id),
        )
        .await;

        // Arm the quiescence timeout; it is pushed out every time an LSA is
        // accepted.
        self.state.quiesce_task = Some(tasks::lsa_quiesce_timeout(
            self.config.timers.quiesce_interval,
            &protocol_inputp,
        ));

        // Main event loop.
        while let Some(msg) = protocol_inputc.recv().await {
            match msg {
                ProtocolInputMsg::NetRxDatagram(msg) => {
                    events::process_datagram(&mut self, msg.datagram).await;
                }
                ProtocolInputMsg::LsaQuiesce(_) => {
                    events::process_quiescence(&mut self, &protocol_inputp);
                }
                ProtocolInputMsg::ForwardTimeout(_) => {
                    break;
                }
            }
        }

        // Leave a record of what the router learned, then release all
        // sockets by dropping them.
        Debug::LsdbDump(&self.state.lsdb).log();
        Debug::TableDump(&self.state.table).log();
        Debug::InstanceStop.log();
    }
}
