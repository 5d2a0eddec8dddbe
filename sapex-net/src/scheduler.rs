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

//! Single logical clock and priority-queue scheduler.
//!
//! Tasks in this simulator never actually suspend a call stack: a "cooperative
//! task" is realized as a closure that, when run, does its work for the current
//! instant and then — if it represents a recurring task such as beacon
//! origination or probing — pushes a new closure for its next wakeup. This is
//! the same pop-event / push-follow-up-events loop `bgpsim::network::Network`
//! uses to drive BGP convergence, generalized into an explicit priority queue
//! so that any component (links, beacons, applications, the event manager) can
//! schedule itself without a central step function knowing about every kind of
//! event in advance.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::simulation::Simulation;

/// Logical simulated time, in milliseconds.
pub type Ms = f64;

/// A unit of deferred work. Receives the simulation by mutable reference at
/// the instant it fires; `Simulation::now` has already been advanced to the
/// task's scheduled time before it runs.
pub type Task = Box<dyn FnOnce(&mut Simulation)>;

struct ScheduledTask {
    time: Ms,
    seq: u64,
    task: Task,
}

impl PartialEq for ScheduledTask {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.seq == other.seq
    }
}
impl Eq for ScheduledTask {}

impl PartialOrd for ScheduledTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledTask {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; we want the earliest time (and, on a tie,
        // the earliest insertion order) to come out first, so reverse both.
        other
            .time
            .partial_cmp(&self.time)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Priority queue of time-stamped tasks, with same-time ties broken by
/// insertion order (FIFO).
#[derive(Default)]
pub struct Scheduler {
    queue: BinaryHeap<ScheduledTask>,
    next_seq: u64,
}

impl Scheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `task` to run at absolute time `time`. If `time` is at or
    /// before the task's own observation of "now", it will be the next thing
    /// processed (subject to insertion-order tie-breaking against anything
    /// already due).
    pub fn schedule_at(&mut self, time: Ms, task: Task) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(ScheduledTask { time, seq, task });
    }

    /// Schedule `task` to run `delay` ms after `now`.
    pub fn schedule_after(&mut self, now: Ms, delay: Ms, task: Task) {
        self.schedule_at(now + delay, task);
    }

    /// Number of tasks still queued.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// True if no tasks remain.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Time of the next scheduled task, if any.
    pub fn peek_time(&self) -> Option<Ms> {
        self.queue.peek().map(|t| t.time)
    }

    pub(crate) fn pop_due(&mut self, deadline: Ms) -> Option<(Ms, Task)> {
        if self.queue.peek().map(|t| t.time <= deadline).unwrap_or(false) {
            let ScheduledTask { time, task, .. } = self.queue.pop().unwrap();
            Some((time, task))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_on_ties() {
        let mut sched = Scheduler::new();
        let order = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        for i in 0..5 {
            let order = order.clone();
            sched.schedule_at(
                10.0,
                Box::new(move |_sim: &mut Simulation| order.borrow_mut().push(i)),
            );
        }
        assert_eq!(sched.len(), 5);
        // pop_due needs a Simulation to run the task against; this is exercised
        // end-to-end in simulation::tests instead, this test only checks
        // ordering of the underlying heap keys.
        let mut times: Vec<u64> = Vec::new();
        let mut heap = sched.queue;
        while let Some(t) = heap.pop() {
            times.push(t.seq);
        }
        assert_eq!(times, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn earliest_time_first() {
        let mut sched = Scheduler::new();
        sched.schedule_at(20.0, Box::new(|_: &mut Simulation| {}));
        sched.schedule_at(5.0, Box::new(|_: &mut Simulation| {}));
        sched.schedule_at(15.0, Box::new(|_: &mut Simulation| {}));
        let mut heap = sched.queue;
        let mut times = Vec::new();
        while let Some(t) = heap.pop() {
            times.push(t.time);
        }
        assert_eq!(times, vec![5.0, 15.0, 20.0]);
    }
}
