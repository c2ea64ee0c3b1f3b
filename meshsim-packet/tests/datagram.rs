//
// Copyright (c) The Meshsim Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;
use std::sync::LazyLock as Lazy;

use meshsim_packet::Datagram;
use meshsim_packet::error::DecodeError;
use meshsim_packet::ipv4::Ipv4Hdr;
use meshsim_packet::lsa::{Destination, LsaPdu, ReachabilityEntry};
use meshsim_packet::segment::{Segment, SegmentFlags};
use pretty_assertions::assert_eq;

//
// Helper functions.
//

fn test_encode_datagram(bytes_expected: &[u8], datagram: &Datagram) {
    let bytes_actual = datagram.encode();
    assert_eq!(bytes_expected, bytes_actual.as_ref());
}

fn test_decode_datagram(bytes: &[u8], datagram_expected: &Datagram) {
    let datagram_actual = Datagram::decode(bytes).unwrap();
    assert_eq!(*datagram_expected, datagram_actual);
}

//
// Test datagrams.
//

static IP_HDR1: Lazy<(Vec<u8>, Datagram)> = Lazy::new(|| {
    (
        vec![
            0x45, 0x00, 0x00, 0x28, 0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0x00,
            0x00, 0x7f, 0x00, 0x00, 0x02, 0x7f, 0x80, 0x00, 0x01,
        ],
        Datagram::Ip(Ipv4Hdr::new(
            Ipv4Addr::new(127, 0, 0, 2),
            Ipv4Addr::new(127, 128, 0, 1),
        )),
    )
});

static LSA1: Lazy<(Vec<u8>, Datagram)> = Lazy::new(|| {
    let body = "127.0.0.0/24, 0, Gi0/1\r\n\
                2.2.2.2, 3, Gi0/2\r\n\
                3.3.3.3, 9, Gi0/3";
    let bytes = [
        &[
            // IP header.
            0x45, 0x00, 0x00, 0x28, 0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0x00,
            0x00, 0x7f, 0x00, 0x00, 0xfe, 0xe0, 0x00, 0x00, 0x05,
            // LSA header.
            0x01, 0x01, 0x01, 0x01, 0x00, 0x00,
        ][..],
        body.as_bytes(),
    ]
    .concat();

    (
        bytes,
        Datagram::Lsa(LsaPdu::new(
            Ipv4Addr::new(127, 0, 0, 254),
            Ipv4Addr::new(1, 1, 1, 1),
            0,
            vec![
                ReachabilityEntry::new(
                    Destination::Prefix("127.0.0.0/24".parse().unwrap()),
                    0,
                    "Gi0/1".to_owned(),
                ),
                ReachabilityEntry::new(
                    Destination::Host(Ipv4Addr::new(2, 2, 2, 2)),
                    3,
                    "Gi0/2".to_owned(),
                ),
                ReachabilityEntry::new(
                    Destination::Host(Ipv4Addr::new(3, 3, 3, 3)),
                    9,
                    "Gi0/3".to_owned(),
                ),
            ],
        )),
    )
});

static SEGMENT_SYN1: Lazy<(Vec<u8>, Datagram)> = Lazy::new(|| {
    let bytes = [
        &[
            // IP header.
            0x45, 0x00, 0x00, 0x28, 0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0x00,
            0x00, 0x7f, 0x00, 0x00, 0x01, 0x7f, 0x80, 0x00, 0x01,
            // Transport header.
            0x52, 0x08, 0x1f, 0x90, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x50, 0x02, 0x00, 0x05, 0x00, 0x00, 0x00, 0x00, 0x7f, 0x00,
            0x00, 0xfe,
        ][..],
        b"SYN",
    ]
    .concat();

    (
        bytes,
        Datagram::Segment(Segment::new(
            Ipv4Addr::new(127, 0, 0, 1),
            Ipv4Addr::new(127, 128, 0, 1),
            21000,
            8080,
            0,
            0,
            SegmentFlags::SYN,
            5,
            Ipv4Addr::new(127, 0, 0, 254),
            "SYN",
        )),
    )
});

static SEGMENT_DATA1: Lazy<(Vec<u8>, Datagram)> = Lazy::new(|| {
    let payload = "GET /index.html HTTP/1.1\r\nHost: 127.128.0.1\r\n\r\n";
    let bytes = [
        &[
            // IP header.
            0x45, 0x00, 0x00, 0x28, 0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0x00,
            0x00, 0x7f, 0x00, 0x00, 0x01, 0x7f, 0x80, 0x00, 0x01,
            // Transport header.
            0x52, 0x08, 0x1f, 0x90, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00,
            0x01, 0x50, 0x18, 0x00, 0x04, 0x00, 0x00, 0x00, 0x00, 0x7f, 0x00,
            0x00, 0xfe,
        ][..],
        payload.as_bytes(),
    ]
    .concat();

    (
        bytes,
        Datagram::Segment(Segment::new(
            Ipv4Addr::new(127, 0, 0, 1),
            Ipv4Addr::new(127, 128, 0, 1),
            21000,
            8080,
            1,
            1,
            SegmentFlags::ACK | SegmentFlags::PSH,
            4,
            Ipv4Addr::new(127, 0, 0, 254),
            payload,
        )),
    )
});

//
// Tests.
//

#[test]
fn test_encode_ip_hdr1() {
    let (ref bytes, ref datagram) = *IP_HDR1;
    test_encode_datagram(bytes, datagram);
}

#[test]
fn test_decode_ip_hdr1() {
    let (ref bytes, ref datagram) = *IP_HDR1;
    test_decode_datagram(bytes, datagram);
}

#[test]
fn test_encode_lsa1() {
    let (ref bytes, ref datagram) = *LSA1;
    test_encode_datagram(bytes, datagram);
}

#[test]
fn test_decode_lsa1() {
    let (ref bytes, ref datagram) = *LSA1;
    test_decode_datagram(bytes, datagram);
}

#[test]
fn test_encode_segment_syn1() {
    let (ref bytes, ref datagram) = *SEGMENT_SYN1;
    test_encode_datagram(bytes, datagram);
}

#[test]
fn test_decode_segment_syn1() {
    let (ref bytes, ref datagram) = *SEGMENT_SYN1;
    test_decode_datagram(bytes, datagram);
}

#[test]
fn test_encode_segment_data1() {
    let (ref bytes, ref datagram) = *SEGMENT_DATA1;
    test_encode_datagram(bytes, datagram);
}

#[test]
fn test_decode_segment_data1() {
    let (ref bytes, ref datagram) = *SEGMENT_DATA1;
    test_decode_datagram(bytes, datagram);
}

#[test]
fn test_decode_truncated_ip_hdr() {
    let (ref bytes, _) = *IP_HDR1;
    assert!(matches!(
        Datagram::decode(&bytes[..10]),
        Err(DecodeError::IncompleteHeader(..))
    ));
}

#[test]
fn test_decode_truncated_segment() {
    let (ref bytes, _) = *SEGMENT_SYN1;
    assert!(matches!(
        Datagram::decode(&bytes[..30]),
        Err(DecodeError::IncompleteHeader(..))
    ));
}

#[test]
fn test_decode_truncated_lsa() {
    let (ref bytes, _) = *LSA1;
    assert!(matches!(
        Datagram::decode(&bytes[..23]),
        Err(DecodeError::IncompleteHeader(..))
    ));
}

#[test]
fn test_parse_lsa_body_whitespace() {
    let entries =
        LsaPdu::parse_body("  127.0.0.0/24 ,0,  Gi0/1  \r\n2.2.2.2, 3, Gi0/2\r\n")
            .unwrap();
    assert_eq!(
        entries,
        vec![
            ReachabilityEntry::new(
                Destination::Prefix("127.0.0.0/24".parse().unwrap()),
                0,
                "Gi0/1".to_owned(),
            ),
            ReachabilityEntry::new(
                Destination::Host(Ipv4Addr::new(2, 2, 2, 2)),
                3,
                "Gi0/2".to_owned(),
            ),
        ]
    );
}

#[test]
fn test_parse_lsa_body_empty() {
    assert_eq!(LsaPdu::parse_body(""), Ok(Vec::new()));
    assert_eq!(LsaPdu::parse_body(" \r\n "), Ok(Vec::new()));
}

#[test]
fn test_parse_lsa_body_invalid() {
    assert!(matches!(
        LsaPdu::parse_body("2.2.2.2, 3"),
        Err(DecodeError::InvalidLsaEntry(..))
    ));
    assert!(matches!(
        LsaPdu::parse_body("2.2.2.2, -3, Gi0/2"),
        Err(DecodeError::InvalidLsaEntry(..))
    ));
}
