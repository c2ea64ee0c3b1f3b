//
// Copyright (c) The Meshsim Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;
use std::time::Duration;

use meshsim_utils::socket::RawSocket;

use crate::conn::{Connection, server_fsm};
use crate::debug::Debug;
use crate::error::{Error, IoError};
use crate::gbn::{GbnReceiver, GbnSender, HDR_OVERHEAD};
use crate::store::ResourceStore;
use crate::{http, network};

// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerCfg {
    // Address the server binds to.
    pub local_addr: Ipv4Addr,
    // First-hop router address.
    pub gateway: Ipv4Addr,
    // Listening port.
    pub port: u16,
    // Maximum IP datagram length.
    pub frame_size: usize,
    // Go-Back-N window offered in the handshake.
    pub window: u16,
    // Per-receive timeout: handshake liveness and retransmit trigger.
    pub timeout: Duration,
    // Retransmissions without progress before the transfer is abandoned.
    pub retransmit_budget: Option<usize>,
}

// The HTTP server endpoint. Handles a single connection - passive open,
// one request, one response - then resets and returns.
#[derive(Debug)]
pub struct Server {
    pub config: ServerCfg,
    pub state: server_fsm::State,
    socket: RawSocket,
    store: ResourceStore,
    conn: Connection,
}

// ===== impl Server =====

impl Server {
    // Create the server and bind its socket.
    pub fn new(
        config: ServerCfg,
        store: ResourceStore,
    ) -> Result<Server, Error> {
        let socket = RawSocket::bind(config.local_addr)
            .map_err(|error| Error::from(IoError::SocketError(error)))?;
        let conn = Self::fresh_conn(&config);

        Ok(Server {
            config,
            state: server_fsm::State::Closed,
            socket,
            store,
            conn,
        })
    }

    fn fresh_conn(config: &ServerCfg) -> Connection {
        Connection::new(
            config.local_addr,
            Ipv4Addr::UNSPECIFIED,
            config.gateway,
            config.port,
            0,
            config.frame_size,
            config.window,
        )
    }

    // Serve one connection.
    pub async fn run(&mut self) -> Result<(), Error> {
        let result = self.serve().await;
        self.reset();
        result
    }

    async fn serve(&mut self) -> Result<(), Error> {
        self.accept().await?;

        let request = self.recv_request().await?;
        Debug::RequestRx(&request).log();

        let response = http::handle_request(&mut self.store, &request);
        Debug::ResponseTx(&response.data).log();
        self.send_response(&response).await?;
        self.state = server_fsm::State::FinSent;

        Ok(())
    }

    // Passive open.
    async fn accept(&mut self) -> Result<(), Error> {
        self.state = server_fsm::State::Listen;

        // Wait for a SYN addressed to this endpoint; there is nobody to
        // time out for yet.
        loop {
            let segment = network::recv_segment(
                &self.socket,
                self.conn.local_addr,
                None,
            )
            .await?
            .expect("receive without a timeout cannot expire");

            if self.conn.process_syn(&segment) {
                break;
            }
        }
        self.state = server_fsm::State::SynRcvd;

        let syn_ack = self.conn.syn_ack();
        network::send_segment(&self.socket, self.conn.gateway, syn_ack)
            .await?;

        // The final ACK of the handshake is timeout-guarded; a silent
        // client resets the connection.
        loop {
            let segment = network::recv_segment(
                &self.socket,
                self.conn.local_addr,
                Some(self.config.timeout),
            )
            .await?;
            let Some(segment) = segment else {
                return Err(Error::HandshakeFailed);
            };

            if self.conn.process_ack(&segment) {
                self.state = server_fsm::State::Established;
                Debug::HandshakeDone(self.conn.window).log();
                return Ok(());
            }
        }
    }

    // Reassemble the request; the client FIN-flags its last segment.
    async fn recv_request(&mut self) -> Result<String, Error> {
        let mut receiver = GbnReceiver::new(self.conn.ack_num);

        network::run_receiver(
            &self.socket,
            &mut self.conn,
            &mut receiver,
            None,
        )
        .await?;

        Ok(receiver.into_data())
    }

    // Stream the response with Go-Back-N.
    async fn send_response(
        &mut self,
        response: &http::Response,
    ) -> Result<(), Error> {
        let mut sender = GbnSender::new(
            &response.data,
            self.conn.frame_size - HDR_OVERHEAD,
            self.conn.window as usize,
            self.conn.seq_num,
            self.config.retransmit_budget,
        )
        .with_flags(response.flags);

        network::run_sender(
            &self.socket,
            &mut self.conn,
            &mut sender,
            self.config.timeout,
        )
        .await
    }

    // Drop all connection state, ready for a fresh accept.
    fn reset(&mut self) {
        self.conn = Self::fresh_conn(&self.config);
        self.state = server_fsm::State::Closed;
        Debug::ConnectionClose.log();
    }
}
