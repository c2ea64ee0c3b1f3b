//
// Copyright (c) The Meshsim Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;

use derive_new::new;
use meshsim_packet::segment::{Segment, SegmentFlags};

// Client connection FSM.
pub mod client_fsm {
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub enum State {
        Closed,
        SynSent,
        Established,
        FinSeen,
    }
}

// Server connection FSM.
pub mod server_fsm {
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub enum State {
        Closed,
        Listen,
        SynRcvd,
        Established,
        FinSent,
    }
}

// One endpoint's view of the connection: addressing, the negotiated
// window, and the transfer counters.
//
// Sequence and acknowledgment numbers count whole segments rather than
// payload octets. The methods below are pure segment-in/segment-out
// transitions; socket I/O happens in the drivers.
#[derive(Debug, new)]
pub struct Connection {
    pub local_addr: Ipv4Addr,
    pub peer_addr: Ipv4Addr,
    pub gateway: Ipv4Addr,
    pub local_port: u16,
    pub peer_port: u16,
    pub frame_size: usize,
    pub window: u16,
    #[new(default)]
    pub seq_num: u32,
    #[new(default)]
    pub ack_num: u32,
}

// ===== impl Connection =====

impl Connection {
    // Build the opening SYN of the three-way handshake.
    pub fn syn(&mut self) -> Segment {
        let segment = Segment::new(
            self.local_addr,
            self.peer_addr,
            self.local_port,
            self.peer_port,
            self.seq_num,
            self.ack_num,
            SegmentFlags::SYN,
            self.window,
            self.gateway,
            "SYN",
        );
        self.seq_num += 1;
        segment
    }

    // Process the peer's SYN/ACK, completing the active open.
    //
    // On a match, the acknowledgment number and the negotiated window are
    // recorded and the closing ACK of the handshake is returned.
    pub fn process_syn_ack(&mut self, segment: &Segment) -> Option<Segment> {
        if segment.flags != SegmentFlags::SYN | SegmentFlags::ACK
            || segment.next_hop != self.local_addr
        {
            return None;
        }

        self.ack_num = segment.seq_num + 1;
        self.window = self.window.min(segment.window);

        Some(self.ack_segment())
    }

    // Process a client's SYN, learning the peer and negotiating the window.
    pub fn process_syn(&mut self, segment: &Segment) -> bool {
        if segment.flags != SegmentFlags::SYN
            || segment.next_hop != self.local_addr
        {
            return false;
        }

        self.peer_addr = segment.hdr.saddr;
        self.peer_port = segment.sport;
        self.window = self.window.min(segment.window);
        self.ack_num = segment.seq_num + 1;
        true
    }

    // Build the SYN/ACK reply of the passive open.
    pub fn syn_ack(&mut self) -> Segment {
        let segment = Segment::new(
            self.local_addr,
            self.peer_addr,
            self.local_port,
            self.peer_port,
            self.seq_num,
            self.ack_num,
            SegmentFlags::SYN | SegmentFlags::ACK,
            self.window,
            self.gateway,
            "SYN-ACK",
        );
        self.seq_num += 1;
        segment
    }

    // Check the final ACK of the passive open.
    pub fn process_ack(&self, segment: &Segment) -> bool {
        segment.flags == SegmentFlags::ACK
            && segment.ack_num == self.seq_num
            && segment.next_hop == self.local_addr
    }

    // Build a cumulative acknowledgment for everything received in order
    // so far.
    pub fn ack_segment(&self) -> Segment {
        Segment::new(
            self.local_addr,
            self.peer_addr,
            self.local_port,
            self.peer_port,
            self.seq_num,
            self.ack_num,
            SegmentFlags::ACK,
            self.window,
            self.gateway,
            "ACK",
        )
    }

    // Build one data segment of an outgoing stream.
    pub fn data_segment(
        &self,
        seq_num: u32,
        flags: SegmentFlags,
        payload: &str,
    ) -> Segment {
        Segment::new(
            self.local_addr,
            self.peer_addr,
            self.local_port,
            self.peer_port,
            seq_num,
            self.ack_num,
            flags,
            self.window,
            self.gateway,
            payload,
        )
    }
}

// ===== tests =====

#[cfg(test)]
mod tests {
    use super::*;

    const CLIENT: Ipv4Addr = Ipv4Addr::new(127, 0, 0, 1);
    const SERVER: Ipv4Addr = Ipv4Addr::new(127, 128, 0, 1);
    const CLIENT_GW: Ipv4Addr = Ipv4Addr::new(127, 0, 0, 254);
    const SERVER_GW: Ipv4Addr = Ipv4Addr::new(127, 128, 0, 254);

    fn client_conn() -> Connection {
        Connection::new(CLIENT, SERVER, CLIENT_GW, 21000, 8080, 1024, 5)
    }

    fn server_conn() -> Connection {
        Connection::new(
            SERVER,
            Ipv4Addr::UNSPECIFIED,
            SERVER_GW,
            8080,
            0,
            1024,
            4,
        )
    }

    #[test]
    fn three_way_handshake() {
        let mut client = client_conn();
        let mut server = server_conn();

        // SYN: carries the client's initial sequence number and window.
        let syn = client.syn();
        assert_eq!(syn.flags, SegmentFlags::SYN);
        assert_eq!(syn.next_hop, CLIENT_GW);
        assert_eq!(client.seq_num, 1);

        // The server learns the peer and offers min(4, 5).
        // The next-hop field is rewritten hop by hop; at delivery it names
        // the receiving endpoint.
        let mut syn = syn;
        syn.next_hop = SERVER;
        assert!(server.process_syn(&syn));
        assert_eq!(server.peer_addr, CLIENT);
        assert_eq!(server.peer_port, 21000);
        assert_eq!(server.window, 4);
        assert_eq!(server.ack_num, 1);

        let syn_ack = server.syn_ack();
        assert_eq!(syn_ack.flags, SegmentFlags::SYN | SegmentFlags::ACK);
        assert_eq!(server.seq_num, 1);

        // The client adopts the negotiated window and acknowledges.
        let mut syn_ack = syn_ack;
        syn_ack.next_hop = CLIENT;
        let ack = client.process_syn_ack(&syn_ack).unwrap();
        assert_eq!(client.window, 4);
        assert_eq!(client.ack_num, 1);
        assert_eq!(ack.flags, SegmentFlags::ACK);

        let mut ack = ack;
        ack.next_hop = SERVER;
        assert!(server.process_ack(&ack));
    }

    #[test]
    fn syn_ack_for_someone_else_is_ignored() {
        let mut client = client_conn();
        let mut server = server_conn();

        let mut syn = client.syn();
        syn.next_hop = SERVER;
        server.process_syn(&syn);
        let mut syn_ack = server.syn_ack();

        // Still addressed to a router hop, not to this endpoint.
        syn_ack.next_hop = SERVER_GW;
        assert!(client.process_syn_ack(&syn_ack).is_none());
    }
}
