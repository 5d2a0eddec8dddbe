// Sapex-Sim: discrete-event simulator for inter-domain path-selection algorithms
// Copyright (C) 2024 Sapex-Sim Contributors
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Drives a [`crate::topology::Link`]'s delivery task.
//!
//! `enqueue` appends to the link's FIFO queue and starts the delivery task if
//! the link was idle. The task pops the head, waits `latency_ms`, waits the
//! transmission delay, then hands the packet to `router::receive_packet` —
//! exactly the two-stage suspension the component design calls for. Because
//! only one delivery task runs per link at a time and it always processes the
//! queue head-first, packets are delivered in enqueue order.

use crate::ids::RouterId;
use crate::packet::Packet;
use crate::router;
use crate::simulation::Simulation;

/// Append `packet` to the link `from -> to` and kick off delivery if idle.
/// If the link does not exist, the caller is responsible for treating this as
/// a forwarding drop; `enqueue` itself never fails.
pub fn enqueue(sim: &mut Simulation, from: &RouterId, to: &RouterId, packet: Packet) {
    let Some(link) = sim.topology.link_mut(from, to) else {
        return;
    };
    link.queue.push_back(packet);
    if !link.delivering {
        link.delivering = true;
        start_delivery(sim, from.clone(), to.clone());
    }
}

fn start_delivery(sim: &mut Simulation, from: RouterId, to: RouterId) {
    let latency = sim
        .topology
        .link(&from, &to)
        .expect("link exists while delivering")
        .metrics
        .latency_ms;
    sim.schedule_after(
        latency,
        Box::new(move |sim: &mut Simulation| wait_transmission(sim, from, to)),
    );
}

fn wait_transmission(sim: &mut Simulation, from: RouterId, to: RouterId) {
    let link = sim
        .topology
        .link(&from, &to)
        .expect("link exists while delivering");
    let packet = link
        .queue
        .front()
        .cloned()
        .expect("delivering implies a non-empty queue");
    let trans = link.transmission_delay_ms(packet.size_bytes());
    sim.schedule_after(
        trans,
        Box::new(move |sim: &mut Simulation| deliver(sim, from, to)),
    );
}

fn deliver(sim: &mut Simulation, from: RouterId, to: RouterId) {
    let link = sim
        .topology
        .link_mut(&from, &to)
        .expect("link exists while delivering");
    let packet = link
        .queue
        .pop_front()
        .expect("delivering implies a non-empty queue");
    let more_queued = !link.queue.is_empty();
    if more_queued {
        start_delivery(sim, from, to.clone());
    } else {
        link.delivering = false;
    }
    router::receive_packet(sim, to, packet);
}
