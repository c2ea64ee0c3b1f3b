//
// Copyright (c) The Meshsim Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;
use std::sync::Arc;

use meshsim_packet::Datagram;
use meshsim_utils::Sender;
use meshsim_utils::socket::RawSocket;
use tokio::sync::mpsc::error::SendError;

use crate::error::IoError;
use crate::tasks::messages::ProtocolInputMsg;
use crate::tasks::messages::input::NetRxDatagramMsg;

// ===== global functions =====

// Encode and transmit a datagram on the given socket.
pub(crate) async fn send_datagram(
    socket: &RawSocket,
    dst: Ipv4Addr,
    datagram: &Datagram,
) -> Result<(), IoError> {
    let buf = datagram.encode();
    socket
        .send_to(&buf, dst)
        .await
        .map_err(IoError::SendError)?;

    Ok(())
}

// Receive datagrams from one socket and relay them to the instance task.
pub(crate) async fn read_loop(
    socket: Arc<RawSocket>,
    net_rxp: Sender<ProtocolInputMsg>,
) -> Result<(), SendError<ProtocolInputMsg>> {
    let mut buf = [0; 16384];

    loop {
        // Receive data from the network.
        let num_bytes = match socket.recv(&mut buf).await {
            Ok(num_bytes) => num_bytes,
            Err(error) => {
                IoError::RecvError(error).log();
                continue;
            }
        };

        // Decode datagram.
        let datagram = Datagram::decode(&buf[0..num_bytes]);
        let msg = ProtocolInputMsg::NetRxDatagram(NetRxDatagramMsg { datagram });
        net_rxp.send(msg).await?;
    }
}
