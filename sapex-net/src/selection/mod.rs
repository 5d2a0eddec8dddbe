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

//! The path-selection contract. Every algorithm owns its own path store,
//! unavailable set, candidate/metric state and probe-result map; with
//! single-threaded scheduling none of it needs locking (see the concurrency
//! notes). Dispatch is a trait object (`Box<dyn PathSelection>`) chosen once
//! at simulation setup, the static-language equivalent of the source's
//! compile-time algorithm choice.

pub mod common;
pub mod sapex;
pub mod shortest;
pub mod umcc;

use crate::ids::AsId;
use crate::ids::RouterId;
use crate::scheduler::Ms;
use crate::topology::Topology;

/// Capability set any path-selection algorithm must provide.
pub trait PathSelection {
    /// Populate the path store. If `use_graph_traversal` is `true`, compute
    /// every simple router-level path between every AS pair by graph
    /// traversal; otherwise the store is left to be filled in by beaconing.
    fn discover_paths(&mut self, topology: &Topology, use_graph_traversal: bool);

    /// Register `path` under `(src, dst)`, as beaconing does on every hop and
    /// combination. Returns `true` if newly registered.
    fn register_path(&mut self, src: AsId, dst: AsId, path: Vec<RouterId>) -> bool;

    /// All paths registered for `(src, dst)`, in registration order.
    fn get_paths(&self, src: &AsId, dst: &AsId) -> Vec<Vec<RouterId>>;

    /// Every (src, dst) pair with at least one registered path.
    fn pairs(&self) -> Vec<(AsId, AsId)>;

    /// Select an available path for `(src, dst)`, or `None` if none are known
    /// or available. Any path returned here is available at the time of
    /// return.
    fn select_path(&mut self, src: &AsId, dst: &AsId) -> Option<Vec<RouterId>>;

    /// Record the round-trip time of a previously sent probe.
    fn update_probe_result(&mut self, probe_id: u64, rtt_ms: Ms);

    /// Record a probe send so a later `update_probe_result` can be attributed
    /// to `path`.
    fn record_probe_sent(&mut self, probe_id: u64, path: Vec<RouterId>);

    /// Per-packet feedback from an application: `rtt_sample_ms` is `None` for
    /// a loss event (`is_loss == true`).
    fn update_path_feedback(
        &mut self,
        path: &[RouterId],
        rtt_sample_ms: Option<Ms>,
        is_loss: bool,
        bytes: usize,
    );

    /// Mark `path` down; returns the affected (src, dst) pairs.
    fn mark_path_down(&mut self, path: &[RouterId]) -> Vec<(AsId, AsId)>;

    /// Mark `path` up; returns the affected (src, dst) pairs.
    fn mark_path_up(&mut self, path: &[RouterId]) -> Vec<(AsId, AsId)>;

    /// Availability of `path`.
    fn is_path_available(&self, path: &[RouterId]) -> bool;

    /// Mean of recent probe RTT samples for `path`, or `None` if no samples.
    fn get_path_latency(&self, path: &[RouterId]) -> Option<Ms>;
}
