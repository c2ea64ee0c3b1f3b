//
// Copyright (c) The Meshsim Contributors
//
// SPDX-License-Identifier: MIT
//

use meshsim_packet::segment::Segment;
use tracing::{debug, debug_span};

// Endpoint debug messages.
#[derive(Debug)]
pub enum Debug<'a> {
    SegmentRx(&'a Segment),
    SegmentTx(&'a Segment),
    HandshakeDone(u16),
    RequestRx(&'a str),
    ResponseTx(&'a str),
    ConnectionClose,
}

// ===== impl Debug =====

impl Debug<'_> {
    // Log debug message using the tracing API.
    pub(crate) fn log(&self) {
        match self {
            Debug::SegmentRx(segment) => {
                // Parent span(s): client|server.
                debug_span!("network").in_scope(|| {
                    debug_span!("input").in_scope(|| {
                        let data = serde_json::to_string(&segment).unwrap();
                        debug!(%data, "{}", self);
                    });
                });
            }
            Debug::SegmentTx(segment) => {
                // Parent span(s): client|server.
                debug_span!("network").in_scope(|| {
                    debug_span!("output").in_scope(|| {
                        let data = serde_json::to_string(&segment).unwrap();
                        debug!(%data, "{}", self);
                    });
                });
            }
            Debug::HandshakeDone(window) => {
                // Parent span(s): client|server.
                debug!(%window, "{}", self);
            }
            Debug::RequestRx(request) => {
                // Parent span(s): server.
                debug!(data = %request, "{}", self);
            }
            Debug::ResponseTx(response) => {
                // Parent span(s): server.
                debug!(data = %response, "{}", self);
            }
            Debug::ConnectionClose => {
                // Parent span(s): client|server.
                debug!("{}", self);
            }
        }
    }
}

impl std::fmt::Display for Debug<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::SegmentRx(..) => {
                write!(f, "segment rx")
            }
            Debug::SegmentTx(..) => {
                write!(f, "segment tx")
            }
            Debug::HandshakeDone(..) => {
                write!(f, "connection established")
            }
            Debug::RequestRx(..) => {
                write!(f, "request received")
            }
            Debug::ResponseTx(..) => {
                write!(f, "response ready")
            }
            Debug::ConnectionClose => {
                write!(f, "connection closed")
            }
        }
    }
}
