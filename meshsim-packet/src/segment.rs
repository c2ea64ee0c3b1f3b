//
// Copyright (c) The Meshsim Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;

use bitflags::bitflags;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use meshsim_utils::bytes::{BytesExt, BytesMutExt, TLS_BUF};
use serde::{Deserialize, Serialize};

use crate::Datagram;
use crate::error::{DecodeError, DecodeResult};
use crate::ipv4::Ipv4Hdr;

//
// The transport header rides behind the IP header. It is a TCP header with
// one extension: the trailing next-hop address, which names the immediate
// receiver of the datagram and is rewritten at every router hop.
//
//  0                   1                   2                   3
//  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |          Source Port          |       Destination Port        |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                        Sequence Number                        |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                    Acknowledgment Number                      |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// | Offset| Rsrvd |     Flags     |            Window             |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |           Checksum            |        Urgent Pointer         |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                       Next-Hop Address                        |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Segment {
    pub hdr: Ipv4Hdr,
    pub sport: u16,
    pub dport: u16,
    pub seq_num: u32,
    pub ack_num: u32,
    pub data_offset: u8,
    pub reserved: u8,
    pub flags: SegmentFlags,
    pub window: u16,
    pub cksum: u16,
    pub urgent: u16,
    pub next_hop: Ipv4Addr,
    pub payload: String,
}

// Transport flags.
bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct SegmentFlags: u8 {
        const FIN = 0x01;
        const SYN = 0x02;
        const PSH = 0x08;
        const ACK = 0x10;
    }
}

// ===== impl Segment =====

impl Segment {
    pub const HDR_LENGTH: usize = 24;
    pub const DFLT_DATA_OFFSET: u8 = 5;

    pub fn new(
        saddr: Ipv4Addr,
        daddr: Ipv4Addr,
        sport: u16,
        dport: u16,
        seq_num: u32,
        ack_num: u32,
        flags: SegmentFlags,
        window: u16,
        next_hop: Ipv4Addr,
        payload: impl Into<String>,
    ) -> Segment {
        Segment {
            hdr: Ipv4Hdr::new(saddr, daddr),
            sport,
            dport,
            seq_num,
            ack_num,
            data_offset: Self::DFLT_DATA_OFFSET,
            reserved: 0,
            flags,
            window,
            cksum: 0,
            urgent: 0,
            next_hop,
            payload: payload.into(),
        }
    }

    // Encode segment into a bytes buffer.
    pub fn encode(&self) -> BytesMut {
        TLS_BUF.with(|buf| {
            let mut buf = buf.borrow_mut();
            buf.clear();

            self.hdr.encode_hdr(&mut buf);
            buf.put_u16(self.sport);
            buf.put_u16(self.dport);
            buf.put_u32(self.seq_num);
            buf.put_u32(self.ack_num);
            buf.put_u8((self.data_offset << 4) | (self.reserved & 0x0F));
            buf.put_u8(self.flags.bits());
            buf.put_u16(self.window);
            buf.put_u16(self.cksum);
            buf.put_u16(self.urgent);
            buf.put_ipv4(&self.next_hop);
            buf.put_slice(self.payload.as_bytes());

            buf.clone()
        })
    }

    // Decode segment from a bytes buffer.
    pub fn decode(data: &[u8]) -> DecodeResult<Segment> {
        let mut buf = Bytes::copy_from_slice(data);
        let hdr = Ipv4Hdr::decode(&mut buf)?;
        Self::decode_segment(hdr, &mut buf)
    }

    pub(crate) fn decode_segment(
        hdr: Ipv4Hdr,
        buf: &mut Bytes,
    ) -> DecodeResult<Segment> {
        let sport = buf.try_get_u16()?;
        let dport = buf.try_get_u16()?;
        let seq_num = buf.try_get_u32()?;
        let ack_num = buf.try_get_u32()?;
        let offset_reserved = buf.try_get_u8()?;
        let data_offset = (offset_reserved >> 4) & 0x0F;
        let reserved = offset_reserved & 0x0F;
        let flags = SegmentFlags::from_bits_retain(buf.try_get_u8()?);
        let window = buf.try_get_u16()?;
        let cksum = buf.try_get_u16()?;
        let urgent = buf.try_get_u16()?;
        let next_hop = buf.try_get_ipv4()?;

        let payload = std::str::from_utf8(buf.chunk())
            .map_err(|error| DecodeError::InvalidPayload(error.valid_up_to()))?
            .to_owned();
        buf.advance(buf.remaining());

        Ok(Segment {
            hdr,
            sport,
            dport,
            seq_num,
            ack_num,
            data_offset,
            reserved,
            flags,
            window,
            cksum,
            urgent,
            next_hop,
            payload,
        })
    }
}

impl From<Segment> for Datagram {
    fn from(segment: Segment) -> Datagram {
        Datagram::Segment(segment)
    }
}
