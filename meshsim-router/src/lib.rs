//
// Copyright (c) The Meshsim Contributors
//
// SPDX-License-Identifier: MIT
//

pub mod debug;
pub mod error;
pub mod events;
pub mod flood;
pub mod instance;
pub mod interface;
pub mod lsdb;
pub mod network;
pub mod output;
pub mod route;
pub mod spf;
pub mod tasks;
