//
// Copyright (c) The Meshsim Contributors
//
// SPDX-License-Identifier: MIT
//

use std::io::Read;
use std::net::{Ipv4Addr, SocketAddrV4};

use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use tokio::io::Interest;
use tokio::io::unix::AsyncFd;

/// A raw IPv4 socket bound to one loopback address, which stands in for a
/// physical interface of the simulated internetwork.
///
/// The socket operates at the IP layer (`SOCK_RAW` + `IPPROTO_RAW`): every
/// datagram handed to [`RawSocket::send_to`] must already carry a full IP
/// header, and every buffer returned by [`RawSocket::recv`] starts with one.
/// The kernel fills in the IP checksum on transmit.
#[derive(Debug)]
pub struct RawSocket(AsyncFd<Socket>);

// ===== impl RawSocket =====

impl RawSocket {
    /// Creates a raw IPv4 socket bound to the given address.
    pub fn bind(addr: Ipv4Addr) -> std::io::Result<RawSocket> {
        let socket = Socket::new(
            Domain::IPV4,
            Type::RAW,
            Some(Protocol::from(libc::IPPROTO_RAW)),
        )?;
        socket.set_nonblocking(true)?;
        socket.bind(&SockAddr::from(SocketAddrV4::new(addr, 0)))?;

        Ok(RawSocket(AsyncFd::new(socket)?))
    }

    /// Sends a pre-encoded IP datagram to the given destination address.
    pub async fn send_to(
        &self,
        buf: &[u8],
        dst: Ipv4Addr,
    ) -> std::io::Result<usize> {
        let sockaddr = SockAddr::from(SocketAddrV4::new(dst, 0));
        self.0
            .async_io(Interest::WRITABLE, |socket| {
                socket.send_to(buf, &sockaddr)
            })
            .await
    }

    /// Receives a single IP datagram into the given buffer, returning the
    /// number of bytes read.
    ///
    /// The source of the datagram is not reported here; receivers validate
    /// the source address carried in the decoded IP header instead.
    pub async fn recv(&self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.0
            .async_io(Interest::READABLE, |mut socket| socket.read(buf))
            .await
    }
}
