//
// Copyright (c) The Meshsim Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;

use meshsim_packet::error::DecodeError;
use tracing::{debug, error, warn};

// Router errors.
#[derive(Debug)]
pub enum Error {
    // I/O errors
    IoError(IoError),
    // Datagram input
    DatagramDecodeError(DecodeError),
    UnexpectedPeer(Ipv4Addr),
    // Forwarding
    NoRouteToHost(Ipv4Addr),
    InterfaceNotFound(String),
    // Other
    InterfaceStartError(String, IoError),
}

// Router I/O errors.
#[derive(Debug)]
pub enum IoError {
    SocketError(std::io::Error),
    RecvError(std::io::Error),
    SendError(std::io::Error),
}

// ===== impl Error =====

impl Error {
    pub(crate) fn log(&self) {
        match self {
            Error::IoError(error) => {
                error.log();
            }
            Error::DatagramDecodeError(error) => {
                warn!(%error, "{}", self);
            }
            Error::UnexpectedPeer(addr) => {
                // A receive-all socket sees every datagram on the host;
                // most of them are legitimately someone else's.
                debug!(address = %addr, "{}", self);
            }
            Error::NoRouteToHost(addr) => {
                warn!(address = %addr, "{}", self);
            }
            Error::InterfaceNotFound(name) => {
                warn!(%name, "{}", self);
            }
            Error::InterfaceStartError(name, error) => {
                error!(%name, %error, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::IoError(error) => error.fmt(f),
            Error::DatagramDecodeError(..) => {
                write!(f, "failed to decode datagram")
            }
            Error::UnexpectedPeer(..) => {
                write!(f, "datagram not addressed to this router")
            }
            Error::NoRouteToHost(..) => {
                write!(f, "no forwarding entry matches the destination")
            }
            Error::InterfaceNotFound(..) => {
                write!(f, "forwarding entry names an unknown interface")
            }
            Error::InterfaceStartError(..) => {
                write!(f, "failed to start interface")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(error) => Some(error),
            Error::InterfaceStartError(_, error) => Some(error),
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
