//
// Copyright (c) The Meshsim Contributors
//
// SPDX-License-Identifier: MIT
//

use bytes::TryGetError;
use serde::{Deserialize, Serialize};

// Datagram decode errors.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum DecodeError {
    // The buffer is shorter than the fixed header of the decoded shape.
    IncompleteHeader(usize),
    // An LSA reachability line didn't parse as "destination, cost, interface".
    InvalidLsaEntry(String),
    // The segment payload is not valid UTF-8.
    InvalidPayload(usize),
}

// Type aliases.
pub type DecodeResult<T> = Result<T, DecodeError>;

// ===== impl DecodeError =====

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::IncompleteHeader(available) => {
                write!(f, "Incomplete header: {} bytes available", available)
            }
            DecodeError::InvalidLsaEntry(line) => {
                write!(f, "Invalid LSA reachability entry: {:?}", line)
            }
            DecodeError::InvalidPayload(valid_up_to) => {
                write!(f, "Invalid payload text at offset: {}", valid_up_to)
            }
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<TryGetError> for DecodeError {
    fn from(error: TryGetError) -> DecodeError {
        DecodeError::IncompleteHeader(error.available)
    }
}
