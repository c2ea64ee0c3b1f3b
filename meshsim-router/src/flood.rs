//
// Copyright (c) The Meshsim Contributors
//
// SPDX-License-Identifier: MIT
//

use meshsim_packet::Datagram;
use meshsim_packet::lsa::LsaPdu;

use crate::debug::Debug;
use crate::interface::{Interface, Interfaces};
use crate::network;

// ===== global functions =====

// Flood an installed LSA onward.
//
// The LSA keeps its identity (advertising router, sequence number, body)
// but is re-sourced from the local address of each outgoing interface, so
// the next hop's source-is-a-neighbor check holds.
pub(crate) async fn flood(
    interfaces: &Interfaces,
    arrival_iface: Option<&str>,
    pdu: &LsaPdu,
) {
    for iface in eligible(interfaces, arrival_iface) {
        let fwd_pdu = LsaPdu::new(
            iface.local,
            pdu.adv_rtr,
            pdu.seq_no,
            pdu.entries.clone(),
        );

        Debug::LsaTx(&iface.name, &fwd_pdu).log();
        if let Err(error) = network::send_datagram(
            &iface.socket,
            iface.peer,
            &Datagram::Lsa(fwd_pdu),
        )
        .await
        {
            error.log();
        }
    }
}

// Every interface is eligible except the one the LSA arrived on.
pub(crate) fn eligible<'a>(
    interfaces: &'a Interfaces,
    arrival_iface: Option<&'a str>,
) -> impl Iterator<Item = &'a Interface> {
    interfaces
        .iter()
        .filter(move |iface| Some(iface.name.as_str()) != arrival_iface)
}
