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

//! Application flows: `waiting_start -> selecting -> sending -> (path_down ->
//! selecting) -> done`. Applications are plain data owned by [`Simulation`]
//! in a map keyed by id; every step below is a free function that looks its
//! application back up by id rather than holding `&mut Application` across a
//! suspension point.

use std::collections::HashMap;

use log::info;

use crate::ids::{HostId, RouterId};
use crate::link;
use crate::packet::{DataPacket, Packet};
use crate::router;
use crate::scheduler::Ms;
use crate::simulation::Simulation;

/// Default data packet size used when pacing a flow.
pub const DEFAULT_PACKET_SIZE_BYTES: usize = 1024;
/// Retry delay while no path is available yet.
pub const RETRY_DELAY_MS: Ms = 10.0;

/// One application flow: a fixed amount of data sent from `source` to
/// `destination`, starting at `start_time_ms`.
#[derive(Debug, Clone)]
pub struct Application {
    /// Flow name, for logging.
    pub name: String,
    /// Sending host.
    pub source: HostId,
    /// Receiving host.
    pub destination: HostId,
    /// Absolute time the flow starts trying to select a path.
    pub start_time_ms: Ms,
    /// Total bytes to send.
    pub total_bytes: usize,
    /// Size of each data packet.
    pub packet_size_bytes: usize,
    sent_bytes: usize,
    current_path: Option<Vec<RouterId>>,
    done: bool,
}

impl Application {
    /// Create a new flow.
    pub fn new(
        name: impl Into<String>,
        source: HostId,
        destination: HostId,
        start_time_ms: Ms,
        total_bytes: usize,
        packet_size_bytes: usize,
    ) -> Self {
        Self {
            name: name.into(),
            source,
            destination,
            start_time_ms,
            total_bytes,
            packet_size_bytes,
            sent_bytes: 0,
            current_path: None,
            done: false,
        }
    }

    /// Bytes sent so far.
    pub fn sent_bytes(&self) -> usize {
        self.sent_bytes
    }

    /// True once every byte has been sent and the flow deregistered.
    pub fn is_done(&self) -> bool {
        self.done
    }
}

/// Register `app` with the simulation and schedule its start.
pub fn spawn(sim: &mut Simulation, app: Application) -> u64 {
    let start_time = app.start_time_ms;
    let id = sim.register_application(app);
    sim.schedule_at(
        start_time,
        Box::new(move |sim: &mut Simulation| enter_selecting(sim, id)),
    );
    id
}

fn enter_selecting(sim: &mut Simulation, id: u64) {
    if sim.is_ended() {
        return;
    }
    let Some(app) = sim.application_mut(id) else {
        return;
    };
    if app.done {
        return;
    }
    let name = app.name.clone();
    let src_as = app.source.as_id.clone();
    let dst_as = app.destination.as_id.clone();

    match sim.algorithm.select_path(&src_as, &dst_as) {
        Some(path) => {
            if let Some(app) = sim.application_mut(id) {
                app.current_path = Some(path.clone());
            }
            sim.registry.register(path.clone(), id);
            info!("application {name} selected path {path:?}");
            send_next(sim, id);
        }
        None => {
            sim.schedule_after(
                RETRY_DELAY_MS,
                Box::new(move |sim: &mut Simulation| enter_selecting(sim, id)),
            );
        }
    }
}

fn send_next(sim: &mut Simulation, id: u64) {
    if sim.is_ended() {
        return;
    }
    let Some(app) = sim.application_mut(id) else {
        return;
    };
    // The path may have changed (or vanished) since this closure was
    // scheduled — always act on the application's current state, not a
    // captured snapshot, so a path_down/reselect in between is honored.
    let Some(path) = app.current_path.clone() else {
        return;
    };
    if app.sent_bytes >= app.total_bytes {
        finish(sim, id);
        return;
    }

    let remaining = app.total_bytes - app.sent_bytes;
    let size = app.packet_size_bytes.min(remaining);
    app.sent_bytes += size;
    let source = app.source.clone();
    let destination = app.destination.clone();
    let packet_size_bytes = app.packet_size_bytes;

    let packet = Packet::Data(DataPacket {
        source,
        destination,
        path: path.clone(),
        size_bytes: size,
        probe_id: None,
        timestamp: sim.now,
        is_probe: false,
        returning: false,
    });
    sim.stats.record_sent();

    match path.as_slice() {
        [first, second, ..] => link::enqueue(sim, first, second, packet),
        [only] => router::receive_packet(sim, only.clone(), packet),
        [] => {}
    }

    let gap = pacing_gap_ms(sim, &path, packet_size_bytes);
    sim.schedule_after(
        gap,
        Box::new(move |sim: &mut Simulation| send_next(sim, id)),
    );
}

/// Inter-packet gap: the transmission delay the first link on the path
/// imposes on a packet of this size, so a flow paces itself at the rate its
/// own bottleneck-of-one (first hop) link allows rather than flooding it.
fn pacing_gap_ms(sim: &Simulation, path: &[RouterId], packet_size_bytes: usize) -> Ms {
    match path {
        [first, second, ..] => sim
            .topology
            .link(first, second)
            .map(|l| l.transmission_delay_ms(packet_size_bytes))
            .unwrap_or(0.0),
        _ => 0.0,
    }
}

fn finish(sim: &mut Simulation, id: u64) {
    if let Some(app) = sim.application_mut(id) {
        app.done = true;
        if let Some(path) = app.current_path.take() {
            sim.registry.deregister(&path, id);
        }
    }
    sim.remove_application(id);
}

/// Called by [`ApplicationRegistry::notify_path_down`] for every application
/// registered on `down_path`. Clears the application's path and re-enters
/// `selecting` immediately.
pub fn on_path_down(sim: &mut Simulation, id: u64, down_path: &[RouterId]) {
    let Some(app) = sim.application_mut(id) else {
        return;
    };
    if app.current_path.as_deref() == Some(down_path) {
        app.current_path = None;
        let now = sim.now;
        sim.schedule_at(
            now,
            Box::new(move |sim: &mut Simulation| enter_selecting(sim, id)),
        );
    }
}

/// Maps a router-level path to the applications currently sending on it, in
/// registration order, so a path-down event can notify every interested
/// flow.
#[derive(Debug, Default)]
pub struct ApplicationRegistry {
    by_path: HashMap<Vec<RouterId>, Vec<u64>>,
}

impl ApplicationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that application `app_id` is using `path`.
    pub fn register(&mut self, path: Vec<RouterId>, app_id: u64) {
        let entry = self.by_path.entry(path).or_default();
        if !entry.contains(&app_id) {
            entry.push(app_id);
        }
    }

    /// Stop tracking `app_id` on `path`.
    pub fn deregister(&mut self, path: &[RouterId], app_id: u64) {
        if let Some(entry) = self.by_path.get_mut(path) {
            entry.retain(|id| *id != app_id);
            if entry.is_empty() {
                self.by_path.remove(path);
            }
        }
    }

    /// Application ids registered on `path`, in registration order.
    pub fn apps_for(&self, path: &[RouterId]) -> Vec<u64> {
        self.by_path.get(path).cloned().unwrap_or_default()
    }
}

/// Notify every application registered on `path` that it went down. Calls
/// each in insertion order; since none of these callbacks can panic under
/// normal operation, one app's notification is never skipped by another's.
pub fn notify_path_down(sim: &mut Simulation, path: &[RouterId]) {
    for id in sim.registry.apps_for(path) {
        on_path_down(sim, id, path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::AsId;
    use crate::selection::shortest::ShortestPathSelection;
    use crate::topology::{LinkMetrics, TopologyBuilder};
    use test_log::test;

    fn two_router_topology() -> (crate::topology::Topology, HostId, HostId, Vec<RouterId>) {
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
        let h1 = b.add_host(&a1, "h1", r1.clone()).unwrap();
        let h2 = b.add_host(&a2, "h2", r2.clone()).unwrap();
        (b.build().unwrap(), h1, h2, vec![r1, r2])
    }

    #[test]
    fn flow_with_no_registered_path_retries_until_simulation_ends() {
        let (topo, h1, h2, _path) = two_router_topology();
        let mut sim = Simulation::new(topo, Box::new(ShortestPathSelection::new()));
        spawn(
            &mut sim,
            Application::new("f1", h1, h2, 0.0, 4096, DEFAULT_PACKET_SIZE_BYTES),
        );
        sim.run_until(1000.0);
        assert_eq!(sim.stats.sent, 0);
    }

    #[test]
    fn flow_sends_every_byte_once_a_path_is_registered() {
        let (topo, h1, h2, path) = two_router_topology();
        let mut sim = Simulation::new(topo, Box::new(ShortestPathSelection::new()));
        sim.algorithm
            .register_path(AsId::from("A1"), AsId::from("A2"), path);
        let total = 4096;
        spawn(
            &mut sim,
            Application::new("f1", h1, h2, 0.0, total, DEFAULT_PACKET_SIZE_BYTES),
        );
        sim.run_until(5000.0);
        assert_eq!(sim.stats.sent as usize, total.div_ceil(DEFAULT_PACKET_SIZE_BYTES));
        assert_eq!(sim.stats.received, sim.stats.sent);
    }

    #[test]
    fn path_down_returns_flow_to_selecting() {
        let (topo, h1, h2, path) = two_router_topology();
        let mut sim = Simulation::new(topo, Box::new(ShortestPathSelection::new()));
        sim.algorithm
            .register_path(AsId::from("A1"), AsId::from("A2"), path.clone());
        let id = spawn(
            &mut sim,
            Application::new("f1", h1, h2, 0.0, 1_000_000, DEFAULT_PACKET_SIZE_BYTES),
        );
        sim.run_until(50.0);
        assert!(sim.application_mut(id).unwrap().current_path.is_some());
        sim.algorithm.mark_path_down(&path);
        notify_path_down(&mut sim, &path);
        assert!(sim.application_mut(id).unwrap().current_path.is_none());
    }
}
