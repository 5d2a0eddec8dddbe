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

//! Reference path-selection algorithm: pick the available path with the
//! fewest hops, breaking ties by registration order.

use std::collections::HashMap;

use crate::ids::{AsId, RouterId};
use crate::path_store::PathStore;
use crate::scheduler::Ms;
use crate::selection::common::LatencyWindow;
use crate::selection::PathSelection;
use crate::topology::Topology;

/// Shortest-hop-count reference implementation of [`PathSelection`].
#[derive(Debug, Default)]
pub struct ShortestPathSelection {
    store: PathStore,
    latency: HashMap<Vec<RouterId>, LatencyWindow>,
    probes: super::common::ProbeTracker,
}

impl ShortestPathSelection {
    /// Create an empty selector.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PathSelection for ShortestPathSelection {
    fn discover_paths(&mut self, topology: &Topology, use_graph_traversal: bool) {
        if !use_graph_traversal {
            return;
        }
        let as_ids: Vec<AsId> = topology.as_ids().cloned().collect();
        for src in &as_ids {
            for dst in &as_ids {
                if src == dst {
                    continue;
                }
                for path in topology.discover_paths(src, dst) {
                    self.register_path(src.clone(), dst.clone(), path);
                }
            }
        }
    }

    fn register_path(&mut self, src: AsId, dst: AsId, path: Vec<RouterId>) -> bool {
        self.store.register(src, dst, path)
    }

    fn get_paths(&self, src: &AsId, dst: &AsId) -> Vec<Vec<RouterId>> {
        self.store.get(src, dst).to_vec()
    }

    fn pairs(&self) -> Vec<(AsId, AsId)> {
        self.store.pairs().cloned().collect()
    }

    fn select_path(&mut self, src: &AsId, dst: &AsId) -> Option<Vec<RouterId>> {
        self.store
            .get(src, dst)
            .iter()
            .filter(|p| self.store.is_available(p))
            .min_by_key(|p| p.len())
            .cloned()
    }

    fn update_probe_result(&mut self, probe_id: u64, rtt_ms: Ms) {
        if let Some(path) = self.probes.resolve(probe_id) {
            self.latency.entry(path).or_default().push(rtt_ms);
        }
    }

    fn record_probe_sent(&mut self, probe_id: u64, path: Vec<RouterId>) {
        self.probes.sent(probe_id, path);
    }

    fn update_path_feedback(
        &mut self,
        path: &[RouterId],
        rtt_sample_ms: Option<Ms>,
        _is_loss: bool,
        _bytes: usize,
    ) {
        if let Some(rtt) = rtt_sample_ms {
            self.latency
                .entry(path.to_vec())
                .or_default()
                .push(rtt);
        }
    }

    fn mark_path_down(&mut self, path: &[RouterId]) -> Vec<(AsId, AsId)> {
        self.store.mark_down(path)
    }

    fn mark_path_up(&mut self, path: &[RouterId]) -> Vec<(AsId, AsId)> {
        self.store.mark_up(path)
    }

    fn is_path_available(&self, path: &[RouterId]) -> bool {
        self.store.is_available(path)
    }

    fn get_path_latency(&self, path: &[RouterId]) -> Option<Ms> {
        self.latency.get(path).and_then(LatencyWindow::mean)
    }
}
