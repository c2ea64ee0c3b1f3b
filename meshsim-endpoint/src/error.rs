//
// Copyright (c) The Meshsim Contributors
//
// SPDX-License-Identifier: MIT
//

use meshsim_packet::error::DecodeError;
use tracing::warn;

// Endpoint errors.
#[derive(Debug)]
pub enum Error {
    // I/O errors
    IoError(IoError),
    // Segment input
    SegmentDecodeError(DecodeError),
    // Connection lifecycle
    HandshakeFailed,
    RetransmitBudgetExhausted,
    // Resource store
    StoreIoError(std::io::Error),
    StoreFormatError(serde_json::Error),
}

// Endpoint I/O errors.
#[derive(Debug)]
pub enum IoError {
    SocketError(std::io::Error),
    RecvError(std::io::Error),
    SendError(std::io::Error),
}

// ===== impl Error =====

impl Error {
    pub fn log(&self) {
        match self {
            Error::IoError(error) => {
                error.log();
            }
            Error::SegmentDecodeError(error) => {
                warn!(%error, "{}", self);
            }
            Error::HandshakeFailed | Error::RetransmitBudgetExhausted => {
                warn!("{}", self);
            }
            Error::StoreIoError(error) => {
                warn!(%error, "{}", self);
            }
            Error::StoreFormatError(error) => {
                warn!(%error, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::IoError(error) => error.fmt(f),
            Error::SegmentDecodeError(..) => {
                write!(f, "failed to decode segment")
            }
            Error::HandshakeFailed => {
                write!(f, "handshake didn't complete in time")
            }
            Error::RetransmitBudgetExhausted => {
                write!(f, "too many retransmissions without progress")
            }
            Error::StoreIoError(..) => {
                write!(f, "failed to access the resource store")
            }
            Error::StoreFormatError(..) => {
                write!(f, "failed to parse the resource store")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(error) => Some(error),
            Error::StoreIoError(error) => Some(error),
            Error::StoreFormatError(error) => Some(error),
            _ => None,
        }
    }
}

impl From<IoError> for Error {
    fn from(error: IoError) -> Error {
        Error::IoError(error)
    }
}

// ===== impl IoError =====

impl IoError {
    pub(crate) fn log(&self) {
        match self {
            IoError::SocketError(error)
            | IoError::RecvError(error)
            | IoError::SendError(error) => {
                warn!(%error, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for IoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IoError::SocketError(..) => {
                write!(f, "failed to create raw IP socket")
            }
            IoError::RecvError(..) => {
                write!(f, "failed to receive IP datagram")
            }
            IoError::SendError(..) => {
                write!(f, "failed to send IP datagram")
            }
        }
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IoError::SocketError(error)
            | IoError::RecvError(error)
            | IoError::SendError(error) => Some(error),
        }
    }
}
