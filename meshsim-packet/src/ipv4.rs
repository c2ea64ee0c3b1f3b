//
// Copyright (c) The Meshsim Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use derive_new::new;
use meshsim_utils::bytes::{BytesExt, BytesMutExt, TLS_BUF};
use serde::{Deserialize, Serialize};

use crate::error::DecodeResult;

//
// The IP header format is:
//
//  0                   1                   2                   3
//  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |Version|  IHL  |Type of Service|          Total Length         |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |         Identification        |Flags|      Fragment Offset    |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |  Time to Live |    Protocol   |         Header Checksum       |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                       Source Address                          |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                    Destination Address                        |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//
// The checksum is left as zero on encode; the kernel computes it when the
// datagram is handed to a raw socket.
//
#[derive(Clone, Copy, Debug, Eq, new, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Ipv4Hdr {
    #[new(value = "4")]
    pub version: u8,
    #[new(value = "5")]
    pub ihl: u8,
    #[new(default)]
    pub tos: u8,
    #[new(value = "Self::DFLT_TOTAL_LEN")]
    pub total_len: u16,
    #[new(default)]
    pub ident: u16,
    #[new(default)]
    pub frag_off: u16,
    #[new(value = "Self::DFLT_TTL")]
    pub ttl: u8,
    #[new(value = "Self::PROTO_RAW")]
    pub protocol: u8,
    #[new(default)]
    pub cksum: u16,
    pub saddr: Ipv4Addr,
    pub daddr: Ipv4Addr,
}

// ===== impl Ipv4Hdr =====

impl Ipv4Hdr {
    pub const LENGTH: usize = 20;
    pub const DFLT_TOTAL_LEN: u16 = 40;
    pub const DFLT_TTL: u8 = 255;
    pub const PROTO_RAW: u8 = libc::IPPROTO_RAW as u8;

    // Encode header into a standalone bytes buffer.
    pub fn encode(&self) -> BytesMut {
        TLS_BUF.with(|buf| {
            let mut buf = buf.borrow_mut();
            buf.clear();
            self.encode_hdr(&mut buf);
            buf.clone()
        })
    }

    // Append the 20 header octets to the given buffer.
    pub(crate) fn encode_hdr(&self, buf: &mut BytesMut) {
        buf.put_u8((self.version << 4) | (self.ihl & 0x0F));
        buf.put_u8(self.tos);
        buf.put_u16(self.total_len);
        buf.put_u16(self.ident);
        buf.put_u16(self.frag_off);
        buf.put_u8(self.ttl);
        buf.put_u8(self.protocol);
        buf.put_u16(self.cksum);
        buf.put_ipv4(&self.saddr);
        buf.put_ipv4(&self.daddr);
    }

    // Decode header from the front of the given buffer.
    //
    // The position is advanced past the header; whatever remains belongs to
    // the enclosing datagram shape.
    pub fn decode(buf: &mut Bytes) -> DecodeResult<Ipv4Hdr> {
        let ver_ihl = buf.try_get_u8()?;
        let version = (ver_ihl >> 4) & 0x0F;
        let ihl = ver_ihl & 0x0F;
        let tos = buf.try_get_u8()?;
        let total_len = buf.try_get_u16()?;
        let ident = buf.try_get_u16()?;
        let frag_off = buf.try_get_u16()?;
        let ttl = buf.try_get_u8()?;
        let protocol = buf.try_get_u8()?;
        let cksum = buf.try_get_u16()?;
        let saddr = buf.try_get_ipv4()?;
        let daddr = buf.try_get_ipv4()?;

        Ok(Ipv4Hdr {
            version,
            ihl,
            tos,
            total_len,
            ident,
            frag_off,
            ttl,
            protocol,
            cksum,
            saddr,
            daddr,
        })
    }
}
