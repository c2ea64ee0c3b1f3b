//
// Copyright (c) The Meshsim Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;
use std::str::FromStr;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use derive_new::new;
use ipnetwork::Ipv4Network;
use itertools::Itertools;
use meshsim_utils::bytes::{BytesExt, BytesMutExt, TLS_BUF};
use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, DecodeResult};
use crate::ipv4::Ipv4Hdr;
use crate::{ALL_ROUTERS, Datagram};

//
// A link-state advertisement rides behind the IP header as a fixed 6-octet
// LSA header followed by a textual reachability list:
//
//  0                   1                   2                   3
//  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                      Advertising Router                       |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |        Sequence Number        |     Reachability List ...     |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//
// Each reachability line is "destination, cost, interface"; lines are
// joined by CRLF.
//
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct LsaPdu {
    pub hdr: Ipv4Hdr,
    pub adv_rtr: Ipv4Addr,
    pub seq_no: u16,
    pub entries: Vec<ReachabilityEntry>,
}

// One directly reachable destination advertised by a router: the
// destination itself, the cost of the link, and the name of the interface
// the advertising router reaches it through.
#[derive(Clone, Debug, Eq, new, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct ReachabilityEntry {
    pub dest: Destination,
    pub cost: u32,
    pub iface: String,
}

// A routable destination: either an attached subnet in CIDR form or a bare
// host address (which routes as a /32).
//
// Serialized in its textual form, so it can key JSON maps in logs.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum Destination {
    Prefix(Ipv4Network),
    Host(Ipv4Addr),
}

// ===== impl LsaPdu =====

impl LsaPdu {
    pub const HDR_LENGTH: usize = 6;

    pub fn new(
        saddr: Ipv4Addr,
        adv_rtr: Ipv4Addr,
        seq_no: u16,
        entries: Vec<ReachabilityEntry>,
    ) -> LsaPdu {
        LsaPdu {
            hdr: Ipv4Hdr::new(saddr, ALL_ROUTERS),
            adv_rtr,
            seq_no,
            entries,
        }
    }

    // Encode PDU into a bytes buffer.
    pub fn encode(&self) -> BytesMut {
        TLS_BUF.with(|buf| {
            let mut buf = buf.borrow_mut();
            buf.clear();

            self.hdr.encode_hdr(&mut buf);
            buf.put_ipv4(&self.adv_rtr);
            buf.put_u16(self.seq_no);
            buf.put_slice(self.body().as_bytes());

            buf.clone()
        })
    }

    // Decode PDU from a bytes buffer.
    pub fn decode(data: &[u8]) -> DecodeResult<LsaPdu> {
        let mut buf = Bytes::copy_from_slice(data);
        let hdr = Ipv4Hdr::decode(&mut buf)?;
        Self::decode_pdu(hdr, &mut buf)
    }

    pub(crate) fn decode_pdu(
        hdr: Ipv4Hdr,
        buf: &mut Bytes,
    ) -> DecodeResult<LsaPdu> {
        let adv_rtr = buf.try_get_ipv4()?;
        let seq_no = buf.try_get_u16()?;

        let body = std::str::from_utf8(buf.chunk())
            .map_err(|error| DecodeError::InvalidPayload(error.valid_up_to()))?;
        let entries = Self::parse_body(body)?;
        buf.advance(buf.remaining());

        Ok(LsaPdu {
            hdr,
            adv_rtr,
            seq_no,
            entries,
        })
    }

    // Serialize the reachability list into its textual wire form.
    pub fn body(&self) -> String {
        self.entries
            .iter()
            .map(|entry| {
                format!("{}, {}, {}", entry.dest, entry.cost, entry.iface)
            })
            .join("\r\n")
    }

    // Parse a textual reachability list.
    //
    // Fields are stripped of surrounding whitespace before parsing, so
    // bodies with stray padding or a trailing newline decode cleanly.
    pub fn parse_body(body: &str) -> DecodeResult<Vec<ReachabilityEntry>> {
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }

        body.trim()
            .split("\r\n")
            .map(|line| {
                let invalid =
                    || DecodeError::InvalidLsaEntry(line.to_owned());

                let (dest, cost, iface) = line
                    .split(',')
                    .collect_tuple()
                    .ok_or_else(invalid)?;
                let dest = dest.trim().parse().map_err(|_| invalid())?;
                let cost = cost.trim().parse().map_err(|_| invalid())?;
                let iface = iface.trim().to_owned();

                Ok(ReachabilityEntry { dest, cost, iface })
            })
            .collect()
    }
}

// ===== impl Destination =====

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Destination::Prefix(prefix) => prefix.fmt(f),
            Destination::Host(addr) => addr.fmt(f),
        }
    }
}

impl FromStr for Destination {
    type Err = ipnetwork::IpNetworkError;

    fn from_str(s: &str) -> Result<Destination, Self::Err> {
        if s.contains('/') {
            Ok(Destination::Prefix(s.parse()?))
        } else {
            let addr = s.parse::<Ipv4Addr>().map_err(|_| {
                ipnetwork::IpNetworkError::InvalidAddr(s.to_owned())
            })?;
            Ok(Destination::Host(addr))
        }
    }
}

impl serde::Serialize for Destination {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Destination {
    fn deserialize<D>(deserializer: D) -> Result<Destination, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl From<Ipv4Network> for Destination {
    fn from(prefix: Ipv4Network) -> Destination {
        Destination::Prefix(prefix)
    }
}

impl From<Ipv4Addr> for Destination {
    fn from(addr: Ipv4Addr) -> Destination {
        Destination::Host(addr)
    }
}

impl From<LsaPdu> for Datagram {
    fn from(pdu: LsaPdu) -> Datagram {
        Datagram::Lsa(pdu)
    }
}
