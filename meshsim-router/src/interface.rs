//
// Copyright (c) The Meshsim Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::sync::Arc;

use meshsim_utils::socket::RawSocket;

use crate::error::IoError;

// One simulated point-to-point interface: a loopback address standing in
// for the local end of a link, the address of the neighbor on the far end,
// and the raw socket bound to the local address.
#[derive(Debug)]
pub struct Interface {
    pub name: String,
    pub local: Ipv4Addr,
    pub peer: Ipv4Addr,
    pub socket: Arc<RawSocket>,
}

// The router's forwarding interfaces, keyed by name.
//
// The receive-all socket is deliberately not part of this collection; it
// lives on the router instance as a separate object and never appears as a
// forwarding target.
#[derive(Debug, Default)]
pub struct Interfaces(BTreeMap<String, Interface>);

// ===== impl Interface =====

impl Interface {
    pub(crate) fn new(
        name: &str,
        local: Ipv4Addr,
        peer: Ipv4Addr,
    ) -> Result<Interface, IoError> {
        let socket = RawSocket::bind(local).map_err(IoError::SocketError)?;

        Ok(Interface {
            name: name.to_owned(),
            local,
            peer,
            socket: Arc::new(socket),
        })
    }
}

// ===== impl Interfaces =====

impl Interfaces {
    pub(crate) fn insert(&mut self, iface: Interface) {
        self.0.insert(iface.name.clone(), iface);
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Interface> {
        self.0.get(name)
    }

    // Find the interface whose neighbor owns the given address.
    pub fn get_by_peer(&self, addr: Ipv4Addr) -> Option<&Interface> {
        self.iter().find(|iface| iface.peer == addr)
    }

    // Check whether the given address is bound to one of the interfaces.
    pub fn contains_local(&self, addr: Ipv4Addr) -> bool {
        self.iter().any(|iface| iface.local == addr)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interface> {
        self.0.values()
    }
}
