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

//! `receive_packet` is where every packet arriving at a router is dispatched:
//! beacons go to the beaconing protocol, data/probe packets are forwarded
//! towards their next hop, delivered to a host, or reflected at a probe's
//! terminal router.

use log::{debug, warn};

use crate::beacon;
use crate::ids::RouterId;
use crate::link;
use crate::packet::{DataPacket, Packet};
use crate::simulation::Simulation;

/// Dispatch a packet that has just arrived at router `at`.
pub fn receive_packet(sim: &mut Simulation, at: RouterId, packet: Packet) {
    match packet {
        Packet::Beacon(b) => beacon::handle(sim, at, *b),
        Packet::Data(d) => handle_data(sim, at, d),
    }
}

fn handle_data(sim: &mut Simulation, at: RouterId, data: DataPacket) {
    // A router appearing twice in a path is a topology bug, not something
    // this layer should special-case beyond falling back to the first
    // occurrence, per the forwarding tie-break rule.
    let Some(idx) = data.path.iter().position(|r| *r == at) else {
        warn!("packet arrived at {at}, which is not on its own path {:?}", data.path);
        return;
    };
    let is_last_hop = idx + 1 == data.path.len();

    if data.is_probe && is_last_hop {
        if data.returning {
            complete_probe(sim, data);
        } else {
            reflect_probe(sim, data);
        }
        return;
    }
    if !data.is_probe && is_last_hop {
        deliver_data(sim, &at, data);
        return;
    }

    let next = data.path[idx + 1].clone();
    forward(sim, at, next, data);
}

fn forward(sim: &mut Simulation, from: RouterId, to: RouterId, data: DataPacket) {
    if sim.topology.link(&from, &to).is_some() {
        link::enqueue(sim, &from, &to, Packet::Data(data));
    } else {
        debug!("forwarding drop: no link {from} -> {to}");
        sim.stats.record_lost();
        sim.algorithm
            .update_path_feedback(&data.path, None, true, data.size_bytes);
    }
}

fn deliver_data(sim: &mut Simulation, at: &RouterId, data: DataPacket) {
    let latency = sim.now - data.timestamp;
    if let Some(host) = sim.topology.host_at_router(at) {
        debug_assert_eq!(
            host.id, data.destination,
            "packet reached the path's terminal router but not its destination host"
        );
    }
    sim.stats.record_received(latency);
    sim.algorithm
        .update_path_feedback(&data.path, Some(latency), false, data.size_bytes);
}

/// Reflect a probe at its terminal router: swap endpoints, reverse the
/// router path and mark it as returning, then forward it back along the
/// reversed path's first hop. A single-router path has nowhere to reflect
/// to, so it completes immediately instead.
fn reflect_probe(sim: &mut Simulation, mut data: DataPacket) {
    data.path.reverse();
    std::mem::swap(&mut data.source, &mut data.destination);
    data.returning = true;

    if data.path.len() < 2 {
        complete_probe(sim, data);
        return;
    }
    let from = data.path[0].clone();
    let to = data.path[1].clone();
    forward(sim, from, to, data);
}

fn complete_probe(sim: &mut Simulation, data: DataPacket) {
    let rtt = sim.now - data.timestamp;
    if let Some(probe_id) = data.probe_id {
        sim.algorithm.update_probe_result(probe_id, rtt);
    }
}
