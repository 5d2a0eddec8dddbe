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

//! Periodic RTT probing: every interval, one probe packet is sent down each
//! registered path, reflected at its terminal router by [`crate::router`],
//! and fed back into the selection algorithm's latency window on return.

use crate::ids::{AsId, HostId, RouterId};
use crate::link;
use crate::packet::{DataPacket, Packet};
use crate::router;
use crate::scheduler::Ms;
use crate::simulation::Simulation;

/// Default probing interval.
pub const DEFAULT_INTERVAL_MS: Ms = 1000.0;
/// Fixed probe payload size.
pub const PROBE_SIZE_BYTES: usize = 64;

/// Start the recurring probing task.
pub fn start(sim: &mut Simulation, interval: Ms) {
    tick(sim, interval);
}

fn tick(sim: &mut Simulation, interval: Ms) {
    if sim.is_ended() {
        return;
    }
    // Snapshot pairs and their paths before sending: registration may run
    // concurrently (a beacon delivered at this same instant) and must not
    // invalidate an iterator we are mid-walk of.
    for (src, dst) in sim.algorithm.pairs() {
        let Some(source) = sim.topology.any_host_in(&src).cloned() else {
            continue;
        };
        for path in sim.algorithm.get_paths(&src, &dst) {
            send_probe(sim, source.clone(), &dst, path);
        }
    }
    sim.schedule_after(
        interval,
        Box::new(move |sim: &mut Simulation| tick(sim, interval)),
    );
}

fn send_probe(sim: &mut Simulation, source: HostId, dst_as: &AsId, path: Vec<RouterId>) {
    let Some(first) = path.first().cloned() else {
        return;
    };
    let Some(destination) = sim.topology.any_host_in(dst_as).cloned() else {
        return;
    };
    let probe_id = sim.next_probe_id();
    sim.algorithm.record_probe_sent(probe_id, path.clone());

    let packet = Packet::Data(DataPacket {
        source,
        destination,
        path: path.clone(),
        size_bytes: PROBE_SIZE_BYTES,
        probe_id: Some(probe_id),
        timestamp: sim.now,
        is_probe: true,
        returning: false,
    });

    match path.as_slice() {
        [_, second, ..] => link::enqueue(sim, &first, second, packet),
        [only] => router::receive_packet(sim, only.clone(), packet),
        [] => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::shortest::ShortestPathSelection;
    use crate::simulation::Simulation;
    use crate::topology::{LinkMetrics, TopologyBuilder};
    use test_log::test;

    #[test]
    fn probing_populates_path_latency_over_time() {
        let mut b = TopologyBuilder::new();
        let a1 = b.add_as("A1", false);
        let a2 = b.add_as("A2", false);
        let r1 = b.add_router(&a1, "br1").unwrap();
        let r2 = b.add_router(&a2, "br1").unwrap();
        let m = LinkMetrics {
            latency_ms: 5.0,
            bandwidth_mbps: 100.0,
        };
        b.add_interface(&r1, r2.clone(), m).unwrap();
        b.add_interface(&r2, r1.clone(), m).unwrap();
        b.add_host(&a1, "h1", r1.clone()).unwrap();
        b.add_host(&a2, "h2", r2.clone()).unwrap();
        let topo = b.build().unwrap();

        let mut sim = Simulation::new(topo, Box::new(ShortestPathSelection::new()));
        let path = vec![r1, r2];
        sim.algorithm
            .register_path(AsId::from("A1"), AsId::from("A2"), path.clone());
        sim.start_probing(100.0);
        sim.run_until(550.0);

        let latency = sim.algorithm.get_path_latency(&path);
        assert!(latency.is_some());
        assert!(latency.unwrap() > 0.0);
    }
}
