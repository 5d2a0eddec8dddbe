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

//! Beaconing: periodic origination on core ASes, loop-free propagation,
//! registration of the resulting router-level path, and up/down segment
//! combination at leaf ASes.

use std::collections::HashSet;

use log::{error, info};

use crate::error::SimError;
use crate::ids::{AsId, RouterId};
use crate::link;
use crate::packet::{Beacon, HopInfo, Packet, SegmentType};
use crate::scheduler::Ms;
use crate::simulation::Simulation;
use crate::topology::path_as_sequence_has_no_repeats;

/// Default beacon origination interval.
pub const DEFAULT_INTERVAL_MS: Ms = 1000.0;

/// Start the recurring origination task for every border router of every
/// core AS that has at least one neighbor (an "inter-AS interface").
pub fn start_all(sim: &mut Simulation, interval: Ms) {
    let core_routers: Vec<RouterId> = sim
        .topology
        .core_ases()
        .flat_map(|as_id| sim.topology.get_as(as_id).into_iter().flat_map(|a| a.routers.clone()))
        .filter(|r| sim.topology.neighbors(r).next().is_some())
        .collect();
    for router in core_routers {
        emit(sim, router, interval);
    }
}

fn emit(sim: &mut Simulation, router: RouterId, interval: Ms) {
    if sim.is_ended() {
        return;
    }
    if let Some(origin_as) = sim.topology.get_router(&router).map(|r| r.owner.clone()) {
        let neighbors: Vec<RouterId> = sim.topology.neighbors(&router).cloned().collect();
        for neighbor in neighbors {
            let neighbor_is_core = sim
                .topology
                .get_router(&neighbor)
                .and_then(|r| sim.topology.get_as(&r.owner))
                .map(|a| a.core)
                .unwrap_or(false);
            let segment_type = if neighbor_is_core {
                SegmentType::Core
            } else {
                SegmentType::Down
            };
            let link_metrics = sim.topology.link(&router, &neighbor).map(|l| l.metrics);
            let beacon = Beacon {
                origin_as: origin_as.clone(),
                timestamp: sim.now,
                hops: vec![HopInfo {
                    as_id: origin_as.clone(),
                    router_id: router.clone(),
                    ingress: None,
                    egress: Some(neighbor.clone()),
                    link: link_metrics,
                }],
                segment_type,
                path: vec![router.clone()],
            };
            info!("beacon originated at {router} toward {neighbor}");
            link::enqueue(sim, &router, &neighbor, Packet::Beacon(Box::new(beacon)));
        }
    }
    let again = router.clone();
    sim.schedule_after(
        interval,
        Box::new(move |sim: &mut Simulation| emit(sim, again, interval)),
    );
}

/// Handle a beacon arriving at `at`: loop check, hop append, registration,
/// forwarding to every neighbor not already on the path.
pub fn handle(sim: &mut Simulation, at: RouterId, mut beacon: Beacon) {
    let Some(owner) = sim.topology.get_router(&at).map(|r| r.owner.clone()) else {
        return;
    };

    if beacon.visited(&owner) {
        return;
    }
    debug_assert!(
        !beacon.path.contains(&at),
        "router {at} already in beacon path before append"
    );

    let ingress = beacon.hops.last().map(|h| h.router_id.clone());
    beacon.hops.push(HopInfo {
        as_id: owner.clone(),
        router_id: at.clone(),
        ingress,
        egress: None,
        link: None,
    });
    beacon.path.push(at.clone());

    register(sim, &beacon);

    let neighbors: Vec<RouterId> = sim.topology.neighbors(&at).cloned().collect();
    for neighbor in neighbors {
        if beacon.path.contains(&neighbor) {
            continue;
        }
        let mut clone = beacon.clone();
        if let Some(last) = clone.hops.last_mut() {
            last.egress = Some(neighbor.clone());
            last.link = sim.topology.link(&at, &neighbor).map(|l| l.metrics);
        }
        link::enqueue(sim, &at, &neighbor, Packet::Beacon(Box::new(clone)));
    }
}

fn register(sim: &mut Simulation, beacon: &Beacon) {
    let origin = beacon.origin_as.clone();
    let receiving = beacon
        .hops
        .last()
        .expect("a beacon always has at least the origin hop")
        .as_id
        .clone();
    if origin == receiving {
        return;
    }

    let down_path = beacon.path.clone();
    let mut up_path = down_path.clone();
    up_path.reverse();

    let new_down = sim
        .algorithm
        .register_path(origin.clone(), receiving.clone(), down_path.clone());
    let new_up = sim
        .algorithm
        .register_path(receiving.clone(), origin.clone(), up_path);
    if new_down {
        info!("registered path {origin} -> {receiving}: {down_path:?}");
    }

    if new_down || new_up {
        combine(sim, &origin, &receiving);
    }
}

/// When a new segment is registered at leaf AS `leaf` from core AS `core`,
/// build a leaf-to-leaf path for every other leaf with a known `(core,
/// other_leaf)` down segment, by concatenating the up segment `leaf -> core`
/// with the down segment `core -> other_leaf`, deduplicating the shared pivot
/// router. Stored under both directions.
fn combine(sim: &mut Simulation, core: &AsId, leaf: &AsId) {
    let up_segments = sim.algorithm.get_paths(leaf, core);
    let other_leaves: Vec<AsId> = sim
        .algorithm
        .pairs()
        .into_iter()
        .filter(|(c, l)| c == core && l != leaf)
        .map(|(_, l)| l)
        .collect();

    for up in &up_segments {
        for other_leaf in &other_leaves {
            let down_segments = sim.algorithm.get_paths(core, other_leaf);
            for down in &down_segments {
                let Some(combined) = concat_dedup_pivot(up, down) else {
                    continue;
                };
                if !path_as_sequence_has_no_repeats(&sim.topology, &combined) {
                    let as_sequence: Vec<AsId> = combined
                        .iter()
                        .filter_map(|r| sim.topology.get_router(r).map(|rt| rt.owner.clone()))
                        .collect();
                    error!("{}", SimError::AsRepeatedInPath(as_sequence));
                    continue;
                }
                let reversed: Vec<RouterId> = combined.iter().rev().cloned().collect();
                let added =
                    sim.algorithm
                        .register_path(leaf.clone(), other_leaf.clone(), combined.clone());
                sim.algorithm
                    .register_path(other_leaf.clone(), leaf.clone(), reversed);
                if added {
                    info!("combined path {leaf} -> {other_leaf}: {combined:?}");
                }
            }
        }
    }
}

/// Concatenate `up` (leaf -> core) and `down` (core -> other leaf) when they
/// meet at the same pivot router, dropping the duplicated pivot entry.
/// Rejected (returns `None`) if any router other than the pivot is shared
/// between the two segments — a fully-meshed core can otherwise produce a
/// combined path that revisits a router (and hence its AS) a second time.
fn concat_dedup_pivot(up: &[RouterId], down: &[RouterId]) -> Option<Vec<RouterId>> {
    if up.last() != down.first() {
        return None;
    }
    let up_without_pivot = &up[..up.len() - 1];
    let down_without_pivot = &down[1..];
    let up_routers: HashSet<&RouterId> = up_without_pivot.iter().collect();
    if down_without_pivot.iter().any(|r| up_routers.contains(r)) {
        return None;
    }
    let mut combined = up.to_vec();
    combined.extend(down_without_pivot.iter().cloned());
    Some(combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::shortest::ShortestPathSelection;
    use crate::topology::{LinkMetrics, TopologyBuilder};
    use test_log::test;

    fn triangle() -> crate::simulation::Simulation {
        let mut b = TopologyBuilder::new();
        let core = b.add_as("1-ff00:0:110", true);
        let leaf1 = b.add_as("1-ff00:0:111", false);
        let leaf2 = b.add_as("1-ff00:0:112", false);
        let core_r = b.add_router(&core, "br1").unwrap();
        let leaf1_r = b.add_router(&leaf1, "br1").unwrap();
        let leaf2_r = b.add_router(&leaf2, "br1").unwrap();
        let m = LinkMetrics {
            latency_ms: 5.0,
            bandwidth_mbps: 100.0,
        };
        for (a, b_router) in [
            (&core_r, &leaf1_r),
            (&leaf1_r, &core_r),
            (&core_r, &leaf2_r),
            (&leaf2_r, &core_r),
            (&leaf1_r, &leaf2_r),
            (&leaf2_r, &leaf1_r),
        ] {
            b.add_interface(a, b_router.clone(), m).unwrap();
        }
        let topo = b.build().unwrap();
        crate::simulation::Simulation::new(topo, Box::new(ShortestPathSelection::new()))
    }

    #[test]
    fn loop_free_every_stored_path_has_two_or_three_ases() {
        let mut sim = triangle();
        sim.start_beaconing();
        sim.run_until(5_000.0);
        for (src, dst) in sim.algorithm.pairs() {
            for path in sim.algorithm.get_paths(&src, &dst) {
                let as_sequence: Vec<AsId> = path
                    .iter()
                    .filter_map(|r| sim.topology.get_router(r).map(|rt| rt.owner.clone()))
                    .collect();
                let deduped: std::collections::HashSet<AsId> =
                    as_sequence.iter().cloned().collect();
                assert_eq!(
                    as_sequence.len(),
                    deduped.len(),
                    "AS repeated in stored path: {path:?}"
                );
                assert!(deduped.len() == 2 || deduped.len() == 3);
            }
        }
    }
}
