//
// Copyright (c) The Meshsim Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;
use std::time::Duration;

use meshsim_utils::socket::RawSocket;
use rand::Rng;

use crate::conn::{Connection, client_fsm};
use crate::debug::Debug;
use crate::error::{Error, IoError};
use crate::gbn::{GbnReceiver, GbnSender, HDR_OVERHEAD};
use crate::network;

// Client configuration.
#[derive(Clone, Debug)]
pub struct ClientCfg {
    // Address the client binds to.
    pub local_addr: Ipv4Addr,
    // Address of the server.
    pub server_addr: Ipv4Addr,
    // First-hop router address.
    pub gateway: Ipv4Addr,
    // Server port.
    pub server_port: u16,
    // Maximum IP datagram length.
    pub frame_size: usize,
    // Go-Back-N window offered in the handshake.
    pub window: u16,
    // Per-receive timeout: handshake liveness and retransmit trigger.
    pub timeout: Duration,
    // Wall-clock budget for receiving the response.
    pub response_budget: Duration,
    // Retransmissions without progress before the transfer is abandoned.
    pub retransmit_budget: Option<usize>,
}

// The HTTP client endpoint. Single-connection: handshake, one request,
// one response, close.
#[derive(Debug)]
pub struct Client {
    pub config: ClientCfg,
    pub state: client_fsm::State,
    socket: RawSocket,
    conn: Connection,
}

// ===== impl Client =====

impl Client {
    // Create the client and bind its socket, choosing an ephemeral source
    // port.
    pub fn new(config: ClientCfg) -> Result<Client, Error> {
        let socket = RawSocket::bind(config.local_addr)
            .map_err(|error| Error::from(IoError::SocketError(error)))?;

        let local_port = rand::rng().random_range(1024..=u16::MAX);
        let conn = Connection::new(
            config.local_addr,
            config.server_addr,
            config.gateway,
            local_port,
            config.server_port,
            config.frame_size,
            config.window,
        );

        Ok(Client {
            config,
            state: client_fsm::State::Closed,
            socket,
            conn,
        })
    }

    // Fetch a resource from the server: three-way handshake, segmented
    // request, reassembled response.
    pub async fn request_resource(
        &mut self,
        resource: &str,
        if_modified_since: Option<&str>,
    ) -> Result<String, Error> {
        self.handshake().await?;

        let request = self.build_request(resource, if_modified_since);
        self.send_request(&request).await?;

        let response = self.recv_response().await?;

        self.state = client_fsm::State::Closed;
        Debug::ConnectionClose.log();

        Ok(response)
    }

    // Active open.
    async fn handshake(&mut self) -> Result<(), Error> {
        let syn = self.conn.syn();
        network::send_segment(&self.socket, self.conn.gateway, syn).await?;
        self.state = client_fsm::State::SynSent;

        loop {
            let segment = network::recv_segment(
                &self.socket,
                self.conn.local_addr,
                Some(self.config.timeout),
            )
            .await?;
            let Some(segment) = segment else {
                self.state = client_fsm::State::Closed;
                return Err(Error::HandshakeFailed);
            };

            if let Some(ack) = self.conn.process_syn_ack(&segment) {
                network::send_segment(&self.socket, self.conn.gateway, ack)
                    .await?;
                self.state = client_fsm::State::Established;
                Debug::HandshakeDone(self.conn.window).log();
                return Ok(());
            }
        }
    }

    fn build_request(
        &self,
        resource: &str,
        if_modified_since: Option<&str>,
    ) -> String {
        let mut request = format!(
            "GET {} HTTP/1.1\r\nHost: {}\r\n",
            resource, self.config.server_addr
        );
        if let Some(timestamp) = if_modified_since {
            request.push_str(&format!("If-Modified-Since: {}\r\n", timestamp));
        }
        request.push_str("\r\n");

        request
    }

    // Stream the request with Go-Back-N.
    async fn send_request(&mut self, request: &str) -> Result<(), Error> {
        let mut sender = GbnSender::new(
            request,
            self.conn.frame_size - HDR_OVERHEAD,
            self.conn.window as usize,
            self.conn.seq_num,
            self.config.retransmit_budget,
        );

        network::run_sender(
            &self.socket,
            &mut self.conn,
            &mut sender,
            self.config.timeout,
        )
        .await
    }

    // Reassemble the response until its FIN arrives in order or the
    // response budget runs out.
    async fn recv_response(&mut self) -> Result<String, Error> {
        let mut receiver = GbnReceiver::new(self.conn.ack_num);

        network::run_receiver(
            &self.socket,
            &mut self.conn,
            &mut receiver,
            Some(self.config.response_budget),
        )
        .await?;

        self.state = client_fsm::State::FinSeen;

        Ok(receiver.into_data())
    }
}
