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

//! # sapex-net
//!
//! Simulation kernel for evaluating path-selection algorithms in a hierarchical
//! inter-domain routing architecture: core autonomous systems originate
//! path-construction beacons, non-core autonomous systems extend, combine and
//! register them into router-level paths, and pluggable algorithms choose among
//! the discovered paths for application traffic.
//!
//! The [`Simulation`] is the main entry point. It owns the [`topology::Topology`],
//! drives a single-threaded [`scheduler::Scheduler`], and hands out packets to
//! [`router`] logic. Path selection is pluggable behind the
//! [`selection::PathSelection`] trait; [`selection::shortest::ShortestPathSelection`]
//! and [`selection::sapex::Sapex`] are the two reference implementations.
//!
//! ```no_run
//! use sapex_net::prelude::*;
//!
//! # fn main() -> Result<(), SimError> {
//! let mut builder = TopologyBuilder::new();
//! builder.add_as("1-ff00:0:110", true);
//! // ... add routers, hosts, links ...
//! let topology = builder.build()?;
//! let mut sim = Simulation::new(topology, Box::new(ShortestPathSelection::new()));
//! sim.start_beaconing();
//! sim.run_until(10_000.0);
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod beacon;
pub mod error;
pub mod event_manager;
pub mod ids;
pub mod link;
pub mod packet;
pub mod path_store;
pub mod probing;
pub mod router;
pub mod scheduler;
pub mod selection;
pub mod simulation;
pub mod stats;
pub mod topology;

#[cfg(test)]
mod test;

pub mod prelude {
    //! Convenience re-exports of the most commonly used types.
    pub use crate::application::{Application, ApplicationRegistry};
    pub use crate::error::SimError;
    pub use crate::event_manager::{EventKind, EventManager, ScheduledEvent};
    pub use crate::ids::{AsId, HostId, RouterId};
    pub use crate::packet::{Beacon, DataPacket, HopInfo, Packet, SegmentType};
    pub use crate::path_store::PathStore;
    pub use crate::scheduler::{Ms, Scheduler};
    pub use crate::selection::sapex::Sapex;
    pub use crate::selection::shortest::ShortestPathSelection;
    pub use crate::selection::PathSelection;
    pub use crate::simulation::Simulation;
    pub use crate::stats::Stats;
    pub use crate::topology::{BorderRouter, Host, Link, Topology, TopologyBuilder};
}
