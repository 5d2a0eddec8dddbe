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

//! The simulation kernel: owns the topology, the scheduler, the active
//! path-selection algorithm, run-wide stats, and the application registry.
//! Everything else (links, routers, beacons, applications) reaches these
//! through a `&mut Simulation` handed to it by the scheduler, never through
//! its own back-reference — the non-owning-lookup-by-id design the simulator
//! uses throughout.

use std::collections::HashMap;

use crate::application::{Application, ApplicationRegistry};
use crate::beacon;
use crate::probing;
use crate::scheduler::{Ms, Scheduler, Task};
use crate::selection::PathSelection;
use crate::stats::Stats;
use crate::topology::Topology;

/// Owns every subsystem and drives the event loop.
pub struct Simulation {
    /// The simulated network.
    pub topology: Topology,
    /// The active path-selection algorithm.
    pub algorithm: Box<dyn PathSelection>,
    /// Run-wide sent/received/lost/latency counters.
    pub stats: Stats,
    /// router_path -> interested application ids.
    pub registry: ApplicationRegistry,
    /// Current logical time, ms. Advanced to each task's scheduled time
    /// immediately before it runs.
    pub now: Ms,
    scheduler: Scheduler,
    end_time: Ms,
    applications: HashMap<u64, Application>,
    next_app_id: u64,
    next_probe_id: u64,
}

impl Simulation {
    /// Build a simulation over `topology`, driven by `algorithm`.
    pub fn new(topology: Topology, algorithm: Box<dyn PathSelection>) -> Self {
        Self {
            topology,
            algorithm,
            stats: Stats::new(),
            registry: ApplicationRegistry::new(),
            now: 0.0,
            scheduler: Scheduler::new(),
            end_time: Ms::INFINITY,
            applications: HashMap::new(),
            next_app_id: 0,
            next_probe_id: 0,
        }
    }

    /// True once `now` has reached the deadline passed to [`Simulation::run_until`].
    /// Recurring tasks (beaconing, probing, pacing, retries) check this at each
    /// suspension point and stop rescheduling themselves once it holds.
    pub fn is_ended(&self) -> bool {
        self.now >= self.end_time
    }

    /// Schedule `task` to run at absolute time `time`.
    pub fn schedule_at(&mut self, time: Ms, task: Task) {
        self.scheduler.schedule_at(time, task);
    }

    /// Schedule `task` to run `delay` ms from now.
    pub fn schedule_after(&mut self, delay: Ms, task: Task) {
        let now = self.now;
        self.scheduler.schedule_after(now, delay, task);
    }

    /// Allocate a fresh probe id.
    pub fn next_probe_id(&mut self) -> u64 {
        let id = self.next_probe_id;
        self.next_probe_id += 1;
        id
    }

    /// Take ownership of `app`, returning the id it was registered under.
    pub fn register_application(&mut self, app: Application) -> u64 {
        let id = self.next_app_id;
        self.next_app_id += 1;
        self.applications.insert(id, app);
        id
    }

    /// Look up an application by id.
    pub fn application_mut(&mut self, id: u64) -> Option<&mut Application> {
        self.applications.get_mut(&id)
    }

    /// Drop an application once it has finished sending.
    pub fn remove_application(&mut self, id: u64) -> Option<Application> {
        self.applications.remove(&id)
    }

    /// Start the recurring beacon-origination task on every core AS border
    /// router.
    pub fn start_beaconing(&mut self) {
        beacon::start_all(self, beacon::DEFAULT_INTERVAL_MS);
    }

    /// Start the recurring probing task, firing every `interval` ms.
    pub fn start_probing(&mut self, interval: Ms) {
        probing::start(self, interval);
    }

    /// Process every task due at or before `deadline`, advancing `now` to
    /// each task's scheduled time as it runs, then stop.
    pub fn run_until(&mut self, deadline: Ms) {
        self.end_time = deadline;
        while let Some((time, task)) = self.scheduler.pop_due(deadline) {
            self.now = time;
            task(self);
        }
        if self.now < deadline {
            self.now = deadline;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::shortest::ShortestPathSelection;
    use crate::topology::TopologyBuilder;

    fn empty_sim() -> Simulation {
        let topo = TopologyBuilder::new().build().unwrap();
        Simulation::new(topo, Box::new(ShortestPathSelection::new()))
    }

    #[test]
    fn run_until_advances_now_to_each_due_task_time() {
        let mut sim = empty_sim();
        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        for t in [30.0, 10.0, 20.0] {
            let seen = seen.clone();
            sim.schedule_at(
                t,
                Box::new(move |sim: &mut Simulation| seen.borrow_mut().push(sim.now)),
            );
        }
        sim.run_until(100.0);
        assert_eq!(*seen.borrow(), vec![10.0, 20.0, 30.0]);
        assert_eq!(sim.now, 100.0);
    }

    #[test]
    fn run_until_does_not_run_tasks_past_the_deadline() {
        let mut sim = empty_sim();
        let ran = std::rc::Rc::new(std::cell::RefCell::new(false));
        let ran_clone = ran.clone();
        sim.schedule_at(500.0, Box::new(move |_: &mut Simulation| *ran_clone.borrow_mut() = true));
        sim.run_until(100.0);
        assert!(!*ran.borrow());
        assert_eq!(sim.now, 100.0);
    }

    #[test]
    fn is_ended_reflects_the_active_deadline() {
        let mut sim = empty_sim();
        assert!(!sim.is_ended());
        sim.run_until(50.0);
        assert!(sim.is_ended());
    }
}
