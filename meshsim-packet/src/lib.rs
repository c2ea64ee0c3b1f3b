//
// Copyright (c) The Meshsim Contributors
//
// SPDX-License-Identifier: MIT
//

pub mod error;
pub mod ipv4;
pub mod lsa;
pub mod segment;

use std::net::Ipv4Addr;

use bytes::{Buf, Bytes, BytesMut};
use enum_as_inner::EnumAsInner;
use serde::{Deserialize, Serialize};

use crate::error::DecodeResult;
use crate::ipv4::Ipv4Hdr;
use crate::lsa::LsaPdu;
use crate::segment::Segment;

// Multicast group joined by all simulated routers. Link-state
// advertisements are the only traffic addressed to it.
pub const ALL_ROUTERS: Ipv4Addr = Ipv4Addr::new(224, 0, 0, 5);

// The three datagram shapes that travel over the simulated links: a bare
// IP header, a link-state advertisement, and a transport segment carrying
// HTTP bytes.
#[derive(Clone, Debug, EnumAsInner, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum Datagram {
    Ip(Ipv4Hdr),
    Lsa(LsaPdu),
    Segment(Segment),
}

// ===== impl Datagram =====

impl Datagram {
    // Encode datagram into a bytes buffer.
    pub fn encode(&self) -> BytesMut {
        match self {
            Datagram::Ip(hdr) => hdr.encode(),
            Datagram::Lsa(pdu) => pdu.encode(),
            Datagram::Segment(segment) => segment.encode(),
        }
    }

    // Decode datagram from a bytes buffer.
    //
    // The shape is chosen by the IP destination address: datagrams sent to
    // the all-routers group carry an LSA, anything else with octets past the
    // IP header carries a transport segment.
    pub fn decode(data: &[u8]) -> DecodeResult<Datagram> {
        let mut buf = Bytes::copy_from_slice(data);

        let hdr = Ipv4Hdr::decode(&mut buf)?;
        if hdr.daddr == ALL_ROUTERS {
            let pdu = LsaPdu::decode_pdu(hdr, &mut buf)?;
            Ok(Datagram::Lsa(pdu))
        } else if buf.has_remaining() {
            let segment = Segment::decode_segment(hdr, &mut buf)?;
            Ok(Datagram::Segment(segment))
        } else {
            Ok(Datagram::Ip(hdr))
        }
    }
}
