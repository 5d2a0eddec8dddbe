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

//! Scheduled `path_down` / `path_up` fault injection, read from the traffic
//! file's `events` array and fed into the scheduler at load time.

use log::info;

use crate::application;
use crate::ids::RouterId;
use crate::scheduler::Ms;
use crate::simulation::Simulation;

/// The two event kinds the traffic file can express. Unknown `type` strings
/// are rejected while parsing the traffic file, with a warning, before an
/// `EventManager` is ever built — see the config loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Mark a path unavailable.
    PathDown,
    /// Mark a path available again.
    PathUp,
}

/// One fault-injection event.
#[derive(Debug, Clone)]
pub struct ScheduledEvent {
    /// Which operation to perform.
    pub kind: EventKind,
    /// Absolute simulated time to fire at.
    pub time_ms: Ms,
    /// The router-level path the event targets.
    pub path: Vec<RouterId>,
    /// Optional human-readable description, echoed in the log line.
    pub description: Option<String>,
}

/// Holds every event read from the traffic file until it is scheduled.
#[derive(Debug, Default)]
pub struct EventManager {
    events: Vec<ScheduledEvent>,
}

impl EventManager {
    /// Wrap a list of events, in no particular order.
    pub fn new(events: Vec<ScheduledEvent>) -> Self {
        Self { events }
    }

    /// Schedule every event against `sim`. An event whose `time_ms` has
    /// already passed fires at the current instant instead of rewinding the
    /// clock.
    pub fn schedule(self, sim: &mut Simulation) {
        for event in self.events {
            let at = event.time_ms.max(sim.now);
            sim.schedule_at(
                at,
                Box::new(move |sim: &mut Simulation| run_event(sim, event)),
            );
        }
    }
}

fn run_event(sim: &mut Simulation, event: ScheduledEvent) {
    let suffix = event
        .description
        .as_deref()
        .map(|d| format!(" ({d})"))
        .unwrap_or_default();
    match event.kind {
        EventKind::PathDown => {
            info!("event: path down {:?}{suffix}", event.path);
            sim.algorithm.mark_path_down(&event.path);
            application::notify_path_down(sim, &event.path);
        }
        EventKind::PathUp => {
            info!("event: path up {:?}{suffix}", event.path);
            sim.algorithm.mark_path_up(&event.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{self, Application};
    use crate::ids::{AsId, HostId};
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
    fn path_down_event_marks_the_path_unavailable_and_notifies_apps() {
        let (topo, h1, h2, path) = two_router_topology();
        let mut sim = Simulation::new(topo, Box::new(ShortestPathSelection::new()));
        sim.algorithm
            .register_path(AsId::from("A1"), AsId::from("A2"), path.clone());
        let id = application::spawn(
            &mut sim,
            Application::new("f1", h1, h2, 0.0, 1_000_000, 1024),
        );
        sim.run_until(20.0);
        assert!(sim.application_mut(id).unwrap().sent_bytes() > 0);

        let manager = EventManager::new(vec![ScheduledEvent {
            kind: EventKind::PathDown,
            time_ms: sim.now,
            path: path.clone(),
            description: None,
        }]);
        manager.schedule(&mut sim);
        sim.run_until(30.0);

        assert!(!sim.algorithm.is_path_available(&path));
    }

    #[test]
    fn an_event_in_the_past_fires_immediately_instead_of_rewinding_the_clock() {
        let (topo, _h1, _h2, path) = two_router_topology();
        let mut sim = Simulation::new(topo, Box::new(ShortestPathSelection::new()));
        sim.run_until(100.0);
        let manager = EventManager::new(vec![ScheduledEvent {
            kind: EventKind::PathDown,
            time_ms: 10.0,
            path: path.clone(),
            description: None,
        }]);
        manager.schedule(&mut sim);
        sim.run_until(200.0);
        assert!(sim.now >= 100.0);
        assert!(!sim.algorithm.is_path_available(&path));
    }
}
