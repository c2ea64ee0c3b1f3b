//
// Copyright (c) The Meshsim Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;
use std::time::Duration;

use meshsim_packet::Datagram;
use meshsim_packet::segment::{Segment, SegmentFlags};
use meshsim_utils::socket::RawSocket;
use tokio::time::Instant;

use crate::conn::Connection;
use crate::debug::Debug;
use crate::error::{Error, IoError};
use crate::gbn::{AckOutcome, GbnReceiver, GbnSender};

// ===== global functions =====

// Encode and transmit one segment toward the gateway.
pub(crate) async fn send_segment(
    socket: &RawSocket,
    gateway: Ipv4Addr,
    segment: Segment,
) -> Result<(), Error> {
    Debug::SegmentTx(&segment).log();

    let buf = segment.encode();
    socket
        .send_to(&buf, gateway)
        .await
        .map_err(|error| Error::from(IoError::SendError(error)))?;

    Ok(())
}

// Receive the next segment addressed to this endpoint.
//
// Everything else the raw socket picks up - LSA multicast, transit
// datagrams for other hosts, malformed frames - is skipped. Returns `None`
// when the timeout expires first; with no timeout the call waits
// indefinitely.
pub(crate) async fn recv_segment(
    socket: &RawSocket,
    local_addr: Ipv4Addr,
    timeout: Option<Duration>,
) -> Result<Option<Segment>, Error> {
    let deadline = timeout.map(|timeout| Instant::now() + timeout);
    let mut buf = [0; 16384];

    loop {
        let num_bytes = match deadline {
            Some(deadline) => {
                match tokio::time::timeout_at(deadline, socket.recv(&mut buf))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => return Ok(None),
                }
            }
            None => socket.recv(&mut buf).await,
        };
        let num_bytes = num_bytes
            .map_err(|error| Error::from(IoError::RecvError(error)))?;

        match Datagram::decode(&buf[0..num_bytes]) {
            Ok(Datagram::Segment(segment))
                if segment.hdr.daddr == local_addr =>
            {
                Debug::SegmentRx(&segment).log();
                return Ok(Some(segment));
            }
            // Not for this endpoint; keep listening.
            Ok(_) => continue,
            Err(error) => {
                Error::SegmentDecodeError(error).log();
                continue;
            }
        }
    }
}

// Drive a Go-Back-N sender until the peer has acknowledged the whole
// stream. Shared by the client (request) and the server (response).
pub(crate) async fn run_sender(
    socket: &RawSocket,
    conn: &mut Connection,
    sender: &mut GbnSender,
    timeout: Duration,
) -> Result<(), Error> {
    // Fill the window.
    for data in sender.take_burst() {
        let segment = conn.data_segment(data.seq_num, data.flags, data.payload);
        send_segment(socket, conn.gateway, segment).await?;
    }

    while !sender.is_done() {
        match recv_segment(socket, conn.local_addr, Some(timeout)).await? {
            // Receive timeout: go back to the oldest unacknowledged
            // segment and retransmit the window.
            None => {
                for data in sender.timeout()? {
                    let segment =
                        conn.data_segment(data.seq_num, data.flags, data.payload);
                    send_segment(socket, conn.gateway, segment).await?;
                }
            }
            Some(segment) => {
                // Only a cumulative ACK from the connected peer counts.
                if segment.next_hop != conn.local_addr
                    || segment.hdr.saddr != conn.peer_addr
                    || segment.flags != SegmentFlags::ACK
                {
                    continue;
                }

                if let AckOutcome::Advanced(Some(data)) =
                    sender.process_ack(segment.ack_num)
                {
                    let segment =
                        conn.data_segment(data.seq_num, data.flags, data.payload);
                    send_segment(socket, conn.gateway, segment).await?;
                }
            }
        }
    }

    conn.seq_num = sender.final_seq_num();

    Ok(())
}

// Drive a cumulative receiver until the stream's FIN arrives in order or
// the optional wall-clock budget runs out. Shared by the client (response)
// and the server (request).
pub(crate) async fn run_receiver(
    socket: &RawSocket,
    conn: &mut Connection,
    receiver: &mut GbnReceiver,
    budget: Option<Duration>,
) -> Result<(), Error> {
    let deadline = budget.map(|budget| Instant::now() + budget);

    while !receiver.is_done() {
        let timeout = match deadline {
            Some(deadline) => {
                let remaining = deadline - Instant::now();
                if remaining.is_zero() {
                    break;
                }
                Some(remaining)
            }
            None => None,
        };

        let Some(segment) =
            recv_segment(socket, conn.local_addr, timeout).await?
        else {
            break;
        };
        if segment.next_hop != conn.local_addr
            || segment.hdr.saddr != conn.peer_addr
        {
            continue;
        }

        // Acknowledge cumulatively, whether the segment advanced the
        // stream or was a duplicate.
        if let Some(ack_num) = receiver.process(&segment) {
            conn.ack_num = ack_num;
            let ack = conn.ack_segment();
            send_segment(socket, conn.gateway, ack).await?;
        }
    }

    Ok(())
}
