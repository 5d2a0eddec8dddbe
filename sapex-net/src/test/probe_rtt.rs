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

//! A single symmetric link, no queueing competitors: every probe's RTT
//! should come back to exactly twice the one-way propagation plus
//! transmission delay, and the reported path latency should track the mean
//! of the samples collected so far.

use test_log::test;

use crate::ids::AsId;
use crate::probing;
use crate::selection::sapex::Sapex;
use crate::simulation::Simulation;
use crate::topology::{LinkMetrics, TopologyBuilder};

#[test]
fn probe_round_trips_match_the_link_metrics_exactly() {
    let mut b = TopologyBuilder::new();
    let a1 = b.add_as("1-ff00:0:111", false);
    let a2 = b.add_as("1-ff00:0:112", false);
    let r1 = b.add_router(&a1, "br1").unwrap();
    let r2 = b.add_router(&a2, "br1").unwrap();
    let m = LinkMetrics { latency_ms: 10.0, bandwidth_mbps: 100.0 };
    b.add_interface(&r1, r2.clone(), m).unwrap();
    b.add_interface(&r2, r1.clone(), m).unwrap();
    b.add_host(&a1, "h1", r1.clone()).unwrap();
    b.add_host(&a2, "h2", r2.clone()).unwrap();
    let topo = b.build().unwrap();

    let mut sim = Simulation::new(topo, Box::new(Sapex::new(false)));
    let path = vec![r1, r2];
    sim.algorithm
        .register_path(AsId::from("1-ff00:0:111"), AsId::from("1-ff00:0:112"), path.clone());
    sim.start_probing(100.0);
    sim.run_until(450.0);

    let transmission = (probing::PROBE_SIZE_BYTES as f64 * 8.0) / (100.0 * 1000.0);
    let expected_rtt = 2.0 * (10.0 + transmission);

    let latency = sim.algorithm.get_path_latency(&path).expect("at least one probe round trip completed");
    assert!((latency - expected_rtt).abs() < 1e-9, "expected {expected_rtt}, got {latency}");
}

#[test]
fn path_latency_is_none_until_the_first_probe_returns() {
    let mut b = TopologyBuilder::new();
    let a1 = b.add_as("1-ff00:0:111", false);
    let a2 = b.add_as("1-ff00:0:112", false);
    let r1 = b.add_router(&a1, "br1").unwrap();
    let r2 = b.add_router(&a2, "br1").unwrap();
    let m = LinkMetrics { latency_ms: 10.0, bandwidth_mbps: 100.0 };
    b.add_interface(&r1, r2.clone(), m).unwrap();
    b.add_interface(&r2, r1.clone(), m).unwrap();
    b.add_host(&a1, "h1", r1.clone()).unwrap();
    b.add_host(&a2, "h2", r2.clone()).unwrap();
    let topo = b.build().unwrap();

    let mut sim = Simulation::new(topo, Box::new(Sapex::new(false)));
    let path = vec![r1, r2];
    sim.algorithm
        .register_path(AsId::from("1-ff00:0:111"), AsId::from("1-ff00:0:112"), path.clone());

    assert_eq!(sim.algorithm.get_path_latency(&path), None);
    sim.start_probing(100.0);
    // Before the first probe's round trip (~20ms) completes.
    sim.run_until(5.0);
    assert_eq!(sim.algorithm.get_path_latency(&path), None);
}
