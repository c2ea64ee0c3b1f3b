//
// Copyright (c) The Meshsim Contributors
//
// SPDX-License-Identifier: MIT
//

use meshsim_packet::segment::{Segment, SegmentFlags};

use crate::error::Error;

// Nominal combined overhead of the IP and transport headers; the payload
// of each segment is capped at the frame size minus this.
pub const HDR_OVERHEAD: usize = 60;

// Go-Back-N sender state over a fixed vector of segments.
//
// Sequence numbers count segments: segment `i` of the stream carries
// `init_seq + i`, where `init_seq` is the endpoint's sequence number when
// the transfer starts. The only acceptable acknowledgment at any moment is
// the cumulative ACK of the oldest unacknowledged segment.
#[derive(Debug)]
pub struct GbnSender {
    segments: Vec<String>,
    flags: SegmentFlags,
    init_seq: u32,
    base: usize,
    next: usize,
    window: usize,
    retransmit_budget: Option<usize>,
    retransmits: usize,
}

// One segment the sender wants on the wire.
#[derive(Debug, Eq, PartialEq)]
pub struct DataSegment<'a> {
    pub seq_num: u32,
    pub flags: SegmentFlags,
    pub payload: &'a str,
}

// Outcome of processing an acknowledgment.
#[derive(Debug, Eq, PartialEq)]
pub enum AckOutcome<'a> {
    // Not the cumulative ACK of the current base; nothing changes.
    Ignored,
    // The window slid forward, optionally opening a slot for one more
    // segment to transmit.
    Advanced(Option<DataSegment<'a>>),
}

// Cumulative in-order receiver state.
//
// `expected` mirrors the endpoint's acknowledgment number: the sequence
// number of the next in-order segment. Anything else is discarded, but
// still re-acknowledged so the sender can resynchronize.
#[derive(Debug)]
pub struct GbnReceiver {
    expected: u32,
    data: String,
    done: bool,
}

// ===== impl GbnSender =====

impl GbnSender {
    pub fn new(
        data: &str,
        max_payload: usize,
        window: usize,
        init_seq: u32,
        retransmit_budget: Option<usize>,
    ) -> GbnSender {
        GbnSender {
            segments: segmentize(data, max_payload),
            flags: SegmentFlags::ACK | SegmentFlags::PSH,
            init_seq,
            base: 0,
            next: 0,
            window,
            retransmit_budget,
            retransmits: 0,
        }
    }

    // Use the given flags on every segment instead of ACK|PSH. The FIN
    // promotion on the last segment only applies to ACK|PSH streams; error
    // responses carry their terminal flags on every segment.
    pub fn with_flags(mut self, flags: SegmentFlags) -> GbnSender {
        self.flags = flags;
        self
    }

    // Segments to transmit to fill the window.
    pub fn take_burst(&mut self) -> Vec<DataSegment<'_>> {
        let end = self.segments.len().min(self.base + self.window);
        let range = self.next..end;
        self.next = end;
        range.map(|i| self.data_segment(i)).collect()
    }

    // Process an acknowledgment from the peer.
    pub fn process_ack(&mut self, ack_num: u32) -> AckOutcome<'_> {
        if ack_num != self.init_seq + self.base as u32 + 1 {
            return AckOutcome::Ignored;
        }

        // The window slides; transmit the segment entering it, if any.
        let segment = if self.base + self.window < self.segments.len() {
            let i = self.base + self.window;
            self.next = i + 1;
            Some(i)
        } else {
            None
        };
        self.base += 1;

        AckOutcome::Advanced(segment.map(|i| self.data_segment(i)))
    }

    // Handle a receive timeout: rewind to the oldest unacknowledged
    // segment and retransmit the whole window.
    pub fn timeout(&mut self) -> Result<Vec<DataSegment<'_>>, Error> {
        if let Some(budget) = self.retransmit_budget {
            self.retransmits += 1;
            if self.retransmits > budget {
                return Err(Error::RetransmitBudgetExhausted);
            }
        }

        self.next = self.base;
        Ok(self.take_burst())
    }

    pub fn is_done(&self) -> bool {
        self.base == self.segments.len()
    }

    // The endpoint's sequence number once the whole stream is sent.
    pub fn final_seq_num(&self) -> u32 {
        self.init_seq + self.segments.len() as u32
    }

    fn data_segment(&self, i: usize) -> DataSegment<'_> {
        let mut flags = self.flags;
        if flags == SegmentFlags::ACK | SegmentFlags::PSH
            && i == self.segments.len() - 1
        {
            flags |= SegmentFlags::FIN;
        }

        DataSegment {
            seq_num: self.init_seq + i as u32,
            flags,
            payload: &self.segments[i],
        }
    }
}

// ===== impl GbnReceiver =====

impl GbnReceiver {
    pub fn new(expected: u32) -> GbnReceiver {
        GbnReceiver {
            expected,
            data: String::new(),
            done: false,
        }
    }

    // Process one incoming segment.
    //
    // Returns the cumulative acknowledgment to send back, or `None` when
    // the segment doesn't carry data flags and must not be acknowledged.
    // Only the next in-order segment appends payload and advances the
    // expected sequence number; duplicates just elicit the same ACK again.
    pub fn process(&mut self, segment: &Segment) -> Option<u32> {
        const DATA: SegmentFlags =
            SegmentFlags::ACK.union(SegmentFlags::PSH);
        const DATA_FIN: SegmentFlags = DATA.union(SegmentFlags::FIN);
        const TERMINAL: SegmentFlags =
            SegmentFlags::ACK.union(SegmentFlags::FIN);

        if ![DATA, DATA_FIN, TERMINAL].contains(&segment.flags) {
            return None;
        }

        if segment.seq_num == self.expected {
            self.expected += 1;
            self.data.push_str(&segment.payload);
            if segment.flags.contains(SegmentFlags::FIN) {
                self.done = true;
            }
        }

        Some(self.expected)
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn ack_num(&self) -> u32 {
        self.expected
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn into_data(self) -> String {
        self.data
    }
}

// ===== helper functions =====

// Split application data into payload chunks of at most `max_len` octets,
// preserving order and character boundaries.
fn segmentize(data: &str, max_len: usize) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();

    for ch in data.chars() {
        if current.len() + ch.len_utf8() > max_len {
            segments.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }
    if !current.is_empty() {
        segments.push(current);
    }

    segments
}

// ===== tests =====

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    const CLIENT: Ipv4Addr = Ipv4Addr::new(127, 0, 0, 1);
    const SERVER: Ipv4Addr = Ipv4Addr::new(127, 128, 0, 1);

    fn data_segment(seq_num: u32, flags: SegmentFlags, payload: &str) -> Segment {
        Segment::new(
            SERVER, CLIENT, 8080, 21000, seq_num, 0, flags, 4, CLIENT, payload,
        )
    }

    #[test]
    fn segmentize_chunks() {
        assert_eq!(segmentize("", 4), Vec::<String>::new());
        assert_eq!(segmentize("abc", 4), vec!["abc"]);
        assert_eq!(segmentize("abcd", 4), vec!["abcd"]);
        assert_eq!(segmentize("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn fin_promotion_on_last_segment() {
        let mut sender = GbnSender::new("aabbcc", 2, 5, 1, None);
        let burst = sender.take_burst();

        assert_eq!(burst.len(), 3);
        assert_eq!(burst[0].flags, SegmentFlags::ACK | SegmentFlags::PSH);
        assert_eq!(burst[1].flags, SegmentFlags::ACK | SegmentFlags::PSH);
        assert_eq!(
            burst[2].flags,
            SegmentFlags::ACK | SegmentFlags::PSH | SegmentFlags::FIN
        );
        assert_eq!(burst[2].seq_num, 3);
    }

    #[test]
    fn terminal_flags_are_not_promoted() {
        let flags = SegmentFlags::ACK | SegmentFlags::FIN;
        let mut sender =
            GbnSender::new("error", 1024, 4, 1, None).with_flags(flags);
        let burst = sender.take_burst();

        assert_eq!(burst.len(), 1);
        assert_eq!(burst[0].flags, flags);
    }

    // Window of 3, five segments, s1 lost on the first pass. The receiver
    // keeps re-acknowledging s0 until the sender times out and retransmits
    // from s1; the transfer then runs to completion.
    #[test]
    fn loss_then_recover() {
        let window = 3;
        let mut sender = GbnSender::new("aabbccddee", 2, window, 1, None);
        let mut receiver = GbnReceiver::new(1);

        // Initial burst: s0, s1, s2.
        let burst: Vec<_> = sender
            .take_burst()
            .into_iter()
            .map(|segment| (segment.seq_num, segment.payload.to_owned()))
            .collect();
        assert_eq!(burst.len(), 3);

        // s0 arrives; s1 is lost; s2 arrives out of order and is dropped,
        // re-eliciting the same cumulative ACK.
        let ack = receiver
            .process(&data_segment(1, SegmentFlags::ACK | SegmentFlags::PSH, "aa"))
            .unwrap();
        assert_eq!(ack, 2);
        let dup_ack = receiver
            .process(&data_segment(3, SegmentFlags::ACK | SegmentFlags::PSH, "cc"))
            .unwrap();
        assert_eq!(dup_ack, 2);
        assert_eq!(receiver.data(), "aa");

        // The ACK of s0 slides the window and releases s3.
        match sender.process_ack(2) {
            AckOutcome::Advanced(Some(segment)) => {
                assert_eq!(segment.seq_num, 4);
            }
            outcome => panic!("unexpected outcome: {:?}", outcome),
        }

        // The duplicate ACK is not cumulative for the new base.
        assert_eq!(sender.process_ack(2), AckOutcome::Ignored);

        // Timeout: retransmit the window from s1.
        let retransmit: Vec<_> = sender
            .timeout()
            .unwrap()
            .into_iter()
            .map(|segment| segment.seq_num)
            .collect();
        assert_eq!(retransmit, vec![2, 3, 4]);

        // The receiver now takes s1..s4 in order.
        for (seq_num, payload) in
            [(2, "bb"), (3, "cc"), (4, "dd")]
        {
            let flags = SegmentFlags::ACK | SegmentFlags::PSH;
            let ack = receiver
                .process(&data_segment(seq_num, flags, payload))
                .unwrap();
            assert_eq!(ack, seq_num + 1);
            match sender.process_ack(ack) {
                AckOutcome::Advanced(segment) => {
                    // Only the ACK of s1 opens a new slot (s4).
                    if seq_num == 2 {
                        assert_eq!(segment.unwrap().seq_num, 5);
                    } else {
                        assert!(segment.is_none());
                    }
                }
                outcome => panic!("unexpected outcome: {:?}", outcome),
            }
        }

        let flags =
            SegmentFlags::ACK | SegmentFlags::PSH | SegmentFlags::FIN;
        let ack = receiver.process(&data_segment(5, flags, "ee")).unwrap();
        assert_eq!(ack, 6);
        assert!(receiver.is_done());
        assert_eq!(sender.process_ack(6), AckOutcome::Advanced(None));

        assert!(sender.is_done());
        assert_eq!(sender.final_seq_num(), 6);
        assert_eq!(receiver.data(), "aabbccddee");
    }

    #[test]
    fn duplicate_in_order_segment_is_idempotent() {
        let mut receiver = GbnReceiver::new(1);
        let flags = SegmentFlags::ACK | SegmentFlags::PSH;

        assert_eq!(receiver.process(&data_segment(1, flags, "aa")), Some(2));
        assert_eq!(receiver.data(), "aa");

        // The same segment again: no progress, same ACK.
        assert_eq!(receiver.process(&data_segment(1, flags, "aa")), Some(2));
        assert_eq!(receiver.data(), "aa");
        assert_eq!(receiver.ack_num(), 2);
    }

    #[test]
    fn non_data_flags_are_not_acknowledged() {
        let mut receiver = GbnReceiver::new(1);
        assert_eq!(
            receiver.process(&data_segment(1, SegmentFlags::ACK, "ACK")),
            None
        );
        assert_eq!(receiver.data(), "");
    }

    #[test]
    fn retransmit_budget_exhaustion() {
        let mut sender = GbnSender::new("aabb", 2, 2, 1, Some(1));
        sender.take_burst();

        assert!(sender.timeout().is_ok());
        assert!(matches!(
            sender.timeout(),
            Err(Error::RetransmitBudgetExhausted)
        ));
    }
}
