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

//! Shared topology builders for scenario tests.

use crate::ids::{AsId, HostId, RouterId};
use crate::topology::{LinkMetrics, Topology, TopologyBuilder};

/// Core AS `1-ff00:0:110` with leaves `1-ff00:0:111` and `1-ff00:0:112`:
/// leaf1<->core at 10ms/100Mbps, core<->leaf2 at 20ms/50Mbps. Returns the
/// topology, the two hosts, and the router-level path between them.
#[allow(dead_code)]
pub(crate) fn star_topology() -> (Topology, HostId, HostId, Vec<RouterId>) {
    let mut b = TopologyBuilder::new();
    let core = b.add_as("1-ff00:0:110", true);
    let leaf1 = b.add_as("1-ff00:0:111", false);
    let leaf2 = b.add_as("1-ff00:0:112", false);

    let core_r = b.add_router(&core, "br1").unwrap();
    let leaf1_r = b.add_router(&leaf1, "br1").unwrap();
    let leaf2_r = b.add_router(&leaf2, "br1").unwrap();

    let m1 = LinkMetrics { latency_ms: 10.0, bandwidth_mbps: 100.0 };
    let m2 = LinkMetrics { latency_ms: 20.0, bandwidth_mbps: 50.0 };
    b.add_interface(&leaf1_r, core_r.clone(), m1).unwrap();
    b.add_interface(&core_r, leaf1_r.clone(), m1).unwrap();
    b.add_interface(&core_r, leaf2_r.clone(), m2).unwrap();
    b.add_interface(&leaf2_r, core_r.clone(), m2).unwrap();

    let h1 = b.add_host(&leaf1, "10.0.0.1", leaf1_r.clone()).unwrap();
    let h2 = b.add_host(&leaf2, "10.0.0.2", leaf2_r.clone()).unwrap();

    let path = vec![leaf1_r, core_r, leaf2_r];
    (b.build().unwrap(), h1, h2, path)
}

/// Identifiers for [`star_topology`]'s endpoints, so scenario tests don't
/// each re-spell the ISD-AS strings.
#[allow(dead_code)]
pub(crate) fn leaf1_as() -> AsId {
    AsId::from("1-ff00:0:111")
}

#[allow(dead_code)]
pub(crate) fn leaf2_as() -> AsId {
    AsId::from("1-ff00:0:112")
}
