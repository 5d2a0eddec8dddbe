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

//! Shared-bottleneck detection: per-candidate congestion heuristic plus the
//! intersection-of-router-ids suppression pass Sapex runs before scoring.

use std::collections::{HashSet, VecDeque};

use crate::ids::RouterId;
use crate::scheduler::Ms;

/// Number of most-recent samples considered "recent" for congestion checks.
pub const RECENT_SAMPLES: usize = 3;
/// `recent avg RTT > baseline RTT * RTT_RATIO` is one of the two-of-three
/// congestion conditions.
pub const RTT_RATIO: f64 = 1.5;
/// `recent loss rate > LOSS_THRESHOLD` is one of the two-of-three congestion
/// conditions.
pub const LOSS_THRESHOLD: f64 = 0.05;
/// `recent throughput < baseline throughput * THROUGHPUT_RATIO` is one of the
/// two-of-three congestion conditions.
pub const THROUGHPUT_RATIO: f64 = 0.7;
/// A candidate is congested once at least this many of the three conditions
/// hold.
pub const CONGESTION_VOTES_REQUIRED: usize = 2;

/// Per-(router-path) observed metrics, lazily created on first query for its
/// AS pair and retained for the rest of the run.
#[derive(Debug, Clone)]
pub struct PathCandidate {
    /// The router-level path this candidate tracks.
    pub path: Vec<RouterId>,
    /// Last [`crate::selection::common::WINDOW_SIZE`] probe/feedback RTT
    /// samples.
    pub latency_history: VecDeque<Ms>,
    /// Running mean of `latency_history` (or the sentinel if no samples yet).
    pub avg_latency_ms: Ms,
    /// Cumulative packets sent on this path.
    pub sent: u64,
    /// Cumulative packets lost on this path.
    pub lost: u64,
    /// Last [`crate::selection::common::WINDOW_SIZE`] throughput samples,
    /// Mbps, one per ~100ms window.
    pub throughput_history: VecDeque<f64>,
    /// Whether the congestion heuristic currently flags this candidate.
    pub congested: bool,
    /// Timestamp of the last time this candidate was flagged congested.
    pub last_congestion_ms: Option<Ms>,
    pub(crate) window_start_ms: Ms,
    pub(crate) window_bytes: usize,
}

impl PathCandidate {
    /// Create a fresh candidate for `path`, seeded with `sentinel_latency_ms`.
    pub fn new(path: Vec<RouterId>, sentinel_latency_ms: Ms) -> Self {
        Self {
            path,
            latency_history: VecDeque::new(),
            avg_latency_ms: sentinel_latency_ms,
            sent: 0,
            lost: 0,
            throughput_history: VecDeque::new(),
            congested: false,
            last_congestion_ms: None,
            window_start_ms: 0.0,
            window_bytes: 0,
        }
    }

    /// `lost / sent`, or `0.0` if nothing has been sent yet.
    pub fn loss_rate(&self) -> f64 {
        if self.sent == 0 {
            0.0
        } else {
            self.lost as f64 / self.sent as f64
        }
    }

    /// Most recent throughput sample, or `0.0` if none yet.
    pub fn recent_throughput(&self) -> f64 {
        self.throughput_history.back().copied().unwrap_or(0.0)
    }

    fn recent_avg_rtt(&self) -> f64 {
        mean(self.latency_history.iter().rev().take(RECENT_SAMPLES))
    }

    fn recent_avg_throughput(&self) -> f64 {
        mean(self.throughput_history.iter().rev().take(RECENT_SAMPLES))
    }

    /// The first-quartile value of `history` if it has enough samples,
    /// otherwise the oldest (first) measurement — the baseline the
    /// congestion heuristic compares "recent" values against.
    fn baseline(history: &VecDeque<f64>) -> f64 {
        if history.is_empty() {
            return 0.0;
        }
        if history.len() < 4 {
            return history[0];
        }
        let mut sorted: Vec<f64> = history.iter().copied().collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let idx = sorted.len() / 4;
        sorted[idx]
    }

    /// Recompute `congested` from the current metric history. Returns the new
    /// value.
    pub fn refresh_congestion(&mut self, now: Ms) -> bool {
        let rtt_baseline = Self::baseline(&self.latency_history);
        let throughput_baseline = Self::baseline(&self.throughput_history);

        let mut votes = 0;
        if rtt_baseline > 0.0 && self.recent_avg_rtt() > rtt_baseline * RTT_RATIO {
            votes += 1;
        }
        if self.loss_rate() > LOSS_THRESHOLD {
            votes += 1;
        }
        if throughput_baseline > 0.0
            && self.recent_avg_throughput() < throughput_baseline * THROUGHPUT_RATIO
        {
            votes += 1;
        }

        self.congested = votes >= CONGESTION_VOTES_REQUIRED;
        if self.congested {
            self.last_congestion_ms = Some(now);
        }
        self.congested
    }
}

fn mean<'a>(values: impl Iterator<Item = &'a f64>) -> f64 {
    let values: Vec<f64> = values.copied().collect();
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Run one round of shared-bottleneck detection over `candidates` (already
/// filtered to available paths). Returns the set of paths to suppress for
/// this selection (not marked globally down) — every congested path whose
/// router ids overlap a discovered shared-bottleneck interface set, except
/// the single best-latency representative of each such set.
///
/// Independent bottlenecks are discovered by repeating the intersection pass
/// on the candidate set with already-resolved bottleneck members removed,
/// per the detection algorithm.
pub fn suppress_shared_bottlenecks(candidates: &[&PathCandidate]) -> HashSet<Vec<RouterId>> {
    let mut suppressed = HashSet::new();
    let mut remaining: Vec<&PathCandidate> = candidates.to_vec();

    loop {
        let congested: Vec<&PathCandidate> =
            remaining.iter().copied().filter(|c| c.congested).collect();
        if congested.len() < CONGESTION_VOTES_REQUIRED {
            break;
        }

        let mut intersection: HashSet<RouterId> =
            congested[0].path.iter().cloned().collect();
        for c in &congested[1..] {
            let set: HashSet<RouterId> = c.path.iter().cloned().collect();
            intersection = intersection.intersection(&set).cloned().collect();
        }
        let non_congested_union: HashSet<RouterId> = remaining
            .iter()
            .filter(|c| !c.congested)
            .flat_map(|c| c.path.iter().cloned())
            .collect();
        intersection = intersection
            .difference(&non_congested_union)
            .cloned()
            .collect();

        if intersection.is_empty() {
            break;
        }

        let sharing: Vec<&PathCandidate> = congested
            .iter()
            .copied()
            .filter(|c| c.path.iter().any(|r| intersection.contains(r)))
            .collect();
        let representative_path = sharing
            .iter()
            .min_by(|a, b| a.avg_latency_ms.partial_cmp(&b.avg_latency_ms).unwrap())
            .map(|c| c.path.clone());

        for c in &sharing {
            if Some(c.path.clone()) != representative_path {
                suppressed.insert(c.path.clone());
            }
        }

        let handled: HashSet<Vec<RouterId>> = sharing.iter().map(|c| c.path.clone()).collect();
        remaining.retain(|c| !handled.contains(&c.path));
    }

    suppressed
}
