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

//! Sapex: a path-selection algorithm that scores candidates on latency, loss
//! and throughput, optionally sharpened by UMCC shared-bottleneck detection.

use std::collections::HashMap;

use log::info;

use crate::ids::{AsId, RouterId};
use crate::path_store::PathStore;
use crate::scheduler::Ms;
use crate::selection::common::{LatencyWindow, ProbeTracker};
use crate::selection::umcc::{self, PathCandidate};
use crate::selection::PathSelection;
use crate::topology::Topology;

/// Seed latency for a brand-new candidate with no probe history yet. The
/// source treats this as a fixed constant rather than a config knob (see the
/// Open Question on scoring weights).
pub const SENTINEL_LATENCY_MS: Ms = 1000.0;
/// Penalty, in ms, applied per unit of loss rate when scoring candidates.
pub const ALPHA_LOSS_PENALTY_MS: f64 = 100.0;
/// Penalty applied per unit of `1 / throughput_recent` when scoring
/// candidates. The reference algorithm leaves this at zero.
pub const BETA_THROUGHPUT_PENALTY: f64 = 0.0;
/// Throughput measurement window, ms (§4.9 / §4.9.1: "per 100ms window").
pub const THROUGHPUT_WINDOW_MS: Ms = 100.0;

type AsPair = (AsId, AsId);

/// Sapex reference path-selection algorithm.
pub struct Sapex {
    store: PathStore,
    candidates: HashMap<AsPair, HashMap<Vec<RouterId>, PathCandidate>>,
    latency: HashMap<Vec<RouterId>, LatencyWindow>,
    probes: ProbeTracker,
    umcc_enabled: bool,
    tick: Ms,
}

impl Sapex {
    /// Create a Sapex selector. `umcc_enabled` toggles shared-bottleneck
    /// suppression (§4.9.1) during selection.
    pub fn new(umcc_enabled: bool) -> Self {
        Self {
            store: PathStore::new(),
            candidates: HashMap::new(),
            latency: HashMap::new(),
            probes: ProbeTracker::default(),
            umcc_enabled,
            tick: 0.0,
        }
    }

    fn next_tick(&mut self) -> Ms {
        self.tick += 1.0;
        self.tick
    }

    /// Record `bytes` delivered on `path` for throughput accounting, closing
    /// out a 100ms window into `throughput_history` once it elapses.
    fn record_throughput_sample(candidate: &mut PathCandidate, now: Ms, bytes: usize) {
        if now - candidate.window_start_ms >= THROUGHPUT_WINDOW_MS {
            let elapsed_s = (now - candidate.window_start_ms).max(1.0) / 1000.0;
            let mbps = (candidate.window_bytes as f64 * 8.0 / 1_000_000.0) / elapsed_s;
            if candidate.throughput_history.len() == 10 {
                candidate.throughput_history.pop_front();
            }
            candidate.throughput_history.push_back(mbps);
            candidate.window_start_ms = now;
            candidate.window_bytes = bytes;
        } else {
            candidate.window_bytes += bytes;
        }
    }

    fn candidate_for<'a>(
        candidates: &'a mut HashMap<Vec<RouterId>, PathCandidate>,
        path: &[RouterId],
        seed_latency: Ms,
    ) -> &'a mut PathCandidate {
        candidates
            .entry(path.to_vec())
            .or_insert_with(|| PathCandidate::new(path.to_vec(), seed_latency))
    }

    fn refresh(&mut self, src: &AsId, dst: &AsId) {
        let paths = self.store.get(src, dst).to_vec();
        let latency = &self.latency;
        let now = self.tick;
        let entry = self
            .candidates
            .entry((src.clone(), dst.clone()))
            .or_default();
        for path in &paths {
            let seed = latency
                .get(path)
                .and_then(LatencyWindow::mean)
                .unwrap_or(SENTINEL_LATENCY_MS);
            let candidate = Self::candidate_for(entry, path, seed);
            if let Some(mean) = latency.get(path).and_then(LatencyWindow::mean) {
                candidate.avg_latency_ms = mean;
                candidate.latency_history = latency.get(path).unwrap().samples().clone();
            }
            candidate.refresh_congestion(now);
        }
    }

    fn score(candidate: &PathCandidate) -> f64 {
        let throughput_term = if candidate.recent_throughput() > 0.0 {
            BETA_THROUGHPUT_PENALTY / candidate.recent_throughput()
        } else {
            0.0
        };
        candidate.avg_latency_ms + ALPHA_LOSS_PENALTY_MS * candidate.loss_rate() + throughput_term
    }
}

impl PathSelection for Sapex {
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
        let registered = self.store.get(src, dst).to_vec();
        if registered.is_empty() {
            return None;
        }

        self.next_tick();
        self.refresh(src, dst);

        let available: Vec<Vec<RouterId>> = registered
            .into_iter()
            .filter(|p| self.store.is_available(p))
            .collect();
        if available.is_empty() {
            return None;
        }

        let entry = self.candidates.get(&(src.clone(), dst.clone()))?;
        let pool: Vec<&PathCandidate> =
            available.iter().filter_map(|p| entry.get(p)).collect();

        let suppressed = if self.umcc_enabled {
            umcc::suppress_shared_bottlenecks(&pool)
        } else {
            Default::default()
        };

        // Deterministic tie-break: iterate in registration order, keep the
        // strictly-best score seen so far.
        let mut best: Option<&PathCandidate> = None;
        let mut best_score = f64::INFINITY;
        for path in available.iter() {
            if suppressed.contains(path) {
                continue;
            }
            if let Some(c) = entry.get(path) {
                let s = Self::score(c);
                if s < best_score {
                    best_score = s;
                    best = Some(c);
                }
            }
        }
        best.map(|c| c.path.clone())
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
        is_loss: bool,
        bytes: usize,
    ) {
        if let Some(rtt) = rtt_sample_ms {
            self.latency.entry(path.to_vec()).or_default().push(rtt);
        }
        let now = self.next_tick();
        for candidates in self.candidates.values_mut() {
            if let Some(candidate) = candidates.get_mut(path) {
                candidate.sent += 1;
                if is_loss {
                    candidate.lost += 1;
                } else {
                    Self::record_throughput_sample(candidate, now, bytes);
                }
            }
        }
    }

    fn mark_path_down(&mut self, path: &[RouterId]) -> Vec<(AsId, AsId)> {
        info!("path marked down: {:?}", path);
        self.store.mark_down(path)
    }

    fn mark_path_up(&mut self, path: &[RouterId]) -> Vec<(AsId, AsId)> {
        info!("path marked up: {:?}", path);
        self.store.mark_up(path)
    }

    fn is_path_available(&self, path: &[RouterId]) -> bool {
        self.store.is_available(path)
    }

    fn get_path_latency(&self, path: &[RouterId]) -> Option<Ms> {
        self.latency.get(path).and_then(LatencyWindow::mean)
    }
}
