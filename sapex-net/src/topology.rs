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

//! Topology: autonomous systems, border routers, hosts and links.
//!
//! Mirrors the role `bgpsim::network::Network` plays for BGP topologies: the
//! graph of devices is built once, then handed to the rest of the simulator by
//! shared reference. Unlike `Network`, router identities here are stable
//! strings rather than `petgraph::NodeIndex` values (SCION router ids are
//! meaningful outside the simulator), so the `petgraph` graph is kept
//! internally only to answer adjacency and simple-path questions.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::algo::all_simple_paths;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::ids::{AsId, HostId, RouterId};
use crate::packet::Packet;

/// Propagation latency and bandwidth of a directional interface, as declared
/// in the topology file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkMetrics {
    /// Propagation latency, in ms.
    pub latency_ms: f64,
    /// Bandwidth, in Mbps.
    pub bandwidth_mbps: f64,
}

/// A directional channel between two border routers. Holds an in-order queue
/// and is driven by exactly one delivery task at a time (see `link::enqueue`).
#[derive(Debug, Clone)]
pub struct Link {
    /// Source router.
    pub from: RouterId,
    /// Destination router.
    pub to: RouterId,
    /// Link metrics.
    pub metrics: LinkMetrics,
    pub(crate) queue: VecDeque<Packet>,
    pub(crate) delivering: bool,
}

impl Link {
    fn new(from: RouterId, to: RouterId, metrics: LinkMetrics) -> Self {
        Self {
            from,
            to,
            metrics,
            queue: VecDeque::new(),
            delivering: false,
        }
    }

    /// Transmission delay for a packet of `size_bytes` on this link, in ms.
    pub fn transmission_delay_ms(&self, size_bytes: usize) -> f64 {
        (size_bytes as f64 * 8.0) / (self.metrics.bandwidth_mbps * 1000.0)
    }
}

/// An autonomous system. Immutable after topology build.
#[derive(Debug, Clone)]
pub struct As {
    /// AS identifier.
    pub id: AsId,
    /// Whether this AS originates beacons.
    pub core: bool,
    /// Border routers owned by this AS.
    pub routers: Vec<RouterId>,
    /// Hosts attached to this AS.
    pub hosts: Vec<HostId>,
}

/// A border router. Mutable only during topology build; afterwards only its
/// neighbor link set is consulted (never mutated) by routing logic.
#[derive(Debug, Clone)]
pub struct BorderRouter {
    /// Globally unique router id.
    pub id: RouterId,
    /// Owning AS.
    pub owner: AsId,
    /// Outbound link to each neighbor router id.
    pub neighbors: HashMap<RouterId, LinkMetrics>,
}

/// An end host: source or sink of application traffic.
#[derive(Debug, Clone)]
pub struct Host {
    /// Host identifier (AS, address).
    pub id: HostId,
    /// Attached border router.
    pub border_router: RouterId,
}

/// Owns every AS, router, host and link in the simulated network, plus a
/// `petgraph` view of the router-level adjacency graph used for
/// `discover_paths(true)`.
#[derive(Debug)]
pub struct Topology {
    ases: HashMap<AsId, As>,
    routers: HashMap<RouterId, BorderRouter>,
    hosts: HashMap<HostId, Host>,
    links: HashMap<(RouterId, RouterId), Link>,
    graph: DiGraph<RouterId, LinkMetrics>,
    node_index: HashMap<RouterId, NodeIndex>,
}

impl Topology {
    /// All core AS ids, in declaration order — used to start beacon
    /// origination tasks.
    pub fn core_ases(&self) -> impl Iterator<Item = &AsId> {
        self.ases.values().filter(|a| a.core).map(|a| &a.id)
    }

    /// Look up an AS by id.
    pub fn get_as(&self, id: &AsId) -> Option<&As> {
        self.ases.get(id)
    }

    /// All declared AS ids.
    pub fn as_ids(&self) -> impl Iterator<Item = &AsId> {
        self.ases.keys()
    }

    /// Look up a border router by id.
    pub fn get_router(&self, id: &RouterId) -> Option<&BorderRouter> {
        self.routers.get(id)
    }

    /// Look up a host by id.
    pub fn get_host(&self, id: &HostId) -> Option<&Host> {
        self.hosts.get(id)
    }

    /// An arbitrary host belonging to `as_id`, if any (used by probing to pick
    /// a source endpoint).
    pub fn any_host_in(&self, as_id: &AsId) -> Option<&HostId> {
        self.ases.get(as_id)?.hosts.first()
    }

    /// Iterate the neighbor router ids of `router`.
    pub fn neighbors(&self, router: &RouterId) -> impl Iterator<Item = &RouterId> {
        self.routers
            .get(router)
            .into_iter()
            .flat_map(|r| r.neighbors.keys())
    }

    /// Get the link from `from` to `to`, if declared.
    pub fn link(&self, from: &RouterId, to: &RouterId) -> Option<&Link> {
        self.links.get(&(from.clone(), to.clone()))
    }

    pub(crate) fn link_mut(&mut self, from: &RouterId, to: &RouterId) -> Option<&mut Link> {
        self.links.get_mut(&(from.clone(), to.clone()))
    }

    /// Host in `owner` attached to `router`, used when a data packet reaches
    /// the last hop of its path.
    pub fn host_at_router<'a>(&'a self, router: &RouterId) -> Option<&'a Host> {
        self.hosts.values().find(|h| &h.border_router == router)
    }

    /// Compute every simple router-level path between an AS pair by graph
    /// traversal, rather than relying on beaconing. Used when
    /// `discover_paths(true)` is requested.
    pub fn discover_paths(&self, src_as: &AsId, dst_as: &AsId) -> Vec<Vec<RouterId>> {
        let (Some(src), Some(dst)) = (self.ases.get(src_as), self.ases.get(dst_as)) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for src_router in &src.routers {
            let Some(&start) = self.node_index.get(src_router) else {
                continue;
            };
            for dst_router in &dst.routers {
                let Some(&end) = self.node_index.get(dst_router) else {
                    continue;
                };
                for path in all_simple_paths::<Vec<_>, _>(&self.graph, start, end, 0, None) {
                    let router_path: Vec<RouterId> =
                        path.into_iter().map(|n| self.graph[n].clone()).collect();
                    if path_as_sequence_has_no_repeats(self, &router_path) {
                        out.push(router_path);
                    }
                }
            }
        }
        out
    }

    fn validate(&self) -> Result<(), SimError> {
        for link_router in self.links.keys().flat_map(|(a, b)| [a, b]) {
            if !self.routers.contains_key(link_router) {
                return Err(SimError::UnknownRouterInPath(link_router.clone()));
            }
        }
        Ok(())
    }
}

pub(crate) fn path_as_sequence_has_no_repeats(topo: &Topology, path: &[RouterId]) -> bool {
    let mut seen = HashSet::new();
    for r in path {
        let Some(router) = topo.routers.get(r) else {
            return false;
        };
        if !seen.insert(router.owner.clone()) {
            return false;
        }
    }
    true
}

#[derive(Default)]
struct RouterBuild {
    owner: AsId,
    interfaces: Vec<(RouterId, LinkMetrics)>,
}

/// Incrementally constructs a [`Topology`], validating declarations as it
/// goes. Mirrors the builder-pattern style of `bgpsim::builder`.
#[derive(Default)]
pub struct TopologyBuilder {
    ases: HashMap<AsId, As>,
    router_build: HashMap<RouterId, RouterBuild>,
    hosts: HashMap<HostId, Host>,
}

impl TopologyBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a new AS. `core` marks it as a beacon origin.
    pub fn add_as(&mut self, id: impl Into<AsId>, core: bool) -> AsId {
        let id = id.into();
        self.ases.entry(id.clone()).or_insert_with(|| As {
            id: id.clone(),
            core,
            routers: Vec::new(),
            hosts: Vec::new(),
        });
        id
    }

    /// Declare a border router owned by `as_id`.
    pub fn add_router(&mut self, as_id: &AsId, router_name: &str) -> Result<RouterId, SimError> {
        let router_id = RouterId::global(as_id, router_name);
        let as_entry = self
            .ases
            .get_mut(as_id)
            .ok_or_else(|| SimError::UnknownAs(as_id.clone()))?;
        if !as_entry.routers.contains(&router_id) {
            as_entry.routers.push(router_id.clone());
        }
        self.router_build
            .entry(router_id.clone())
            .or_insert_with(|| RouterBuild {
                owner: as_id.clone(),
                interfaces: Vec::new(),
            });
        Ok(router_id)
    }

    /// Declare a directional interface from `router` to `neighbor`, with the
    /// metrics that side of the link observes. A bidirectional [`Link`] is
    /// only created once both endpoints declare matching interfaces (see
    /// [`TopologyBuilder::build`]).
    pub fn add_interface(
        &mut self,
        router: &RouterId,
        neighbor: RouterId,
        metrics: LinkMetrics,
    ) -> Result<(), SimError> {
        let entry = self
            .router_build
            .get_mut(router)
            .ok_or_else(|| SimError::UnknownRouterInPath(router.clone()))?;
        entry.interfaces.push((neighbor, metrics));
        Ok(())
    }

    /// Declare a host `name` on `as_id`, attached to `border_router`.
    pub fn add_host(
        &mut self,
        as_id: &AsId,
        addr: impl Into<String>,
        border_router: RouterId,
    ) -> Result<HostId, SimError> {
        let host_id = HostId {
            as_id: as_id.clone(),
            addr: addr.into(),
        };
        let as_entry = self
            .ases
            .get_mut(as_id)
            .ok_or_else(|| SimError::UnknownAs(as_id.clone()))?;
        as_entry.hosts.push(host_id.clone());
        self.hosts.insert(
            host_id.clone(),
            Host {
                id: host_id.clone(),
                border_router,
            },
        );
        Ok(host_id)
    }

    /// Finalize the topology. A link is created in both directions between
    /// router A and router B iff A declares an interface to B and B declares
    /// one back to A with matching metrics (per the topology file semantics).
    pub fn build(self) -> Result<Topology, SimError> {
        let mut links = HashMap::new();
        let mut routers = HashMap::new();

        for (id, build) in &self.router_build {
            for (neighbor, metrics) in &build.interfaces {
                let Some(back) = self.router_build.get(neighbor) else {
                    return Err(SimError::DanglingRouter(id.clone(), neighbor.clone()));
                };
                let reciprocal = back
                    .interfaces
                    .iter()
                    .find(|(n, m)| n == id && m.bandwidth_mbps == metrics.bandwidth_mbps && m.latency_ms == metrics.latency_ms);
                if reciprocal.is_none() {
                    return Err(SimError::DanglingRouter(id.clone(), neighbor.clone()));
                }
                links
                    .entry((id.clone(), neighbor.clone()))
                    .or_insert_with(|| Link::new(id.clone(), neighbor.clone(), *metrics));
            }
        }

        for (id, build) in self.router_build {
            let neighbors = build
                .interfaces
                .into_iter()
                .collect::<HashMap<RouterId, LinkMetrics>>();
            routers.insert(
                id.clone(),
                BorderRouter {
                    id,
                    owner: build.owner,
                    neighbors,
                },
            );
        }

        let mut graph = DiGraph::new();
        let mut node_index = HashMap::new();
        for id in routers.keys() {
            node_index.insert(id.clone(), graph.add_node(id.clone()));
        }
        for link in links.values() {
            graph.add_edge(
                node_index[&link.from],
                node_index[&link.to],
                link.metrics,
            );
        }

        let topology = Topology {
            ases: self.ases,
            routers,
            hosts: self.hosts,
            links,
            graph,
            node_index,
        };
        topology.validate()?;
        Ok(topology)
    }
}
