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

//! Error types for the simulation kernel.

use thiserror::Error;

use crate::ids::{AsId, RouterId};

/// Errors raised while building a topology or detecting an internal invariant
/// violation. Operational conditions (path-not-found, forwarding drops, events
/// referencing unknown paths) are not represented here; they are counted or
/// logged at the point they occur, per the error-handling policy of the system.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// An AS referenced by a border router interface was never declared.
    #[error("AS not found in topology: {0}")]
    UnknownAs(AsId),
    /// A border router interface names a neighbor router that does not exist,
    /// or whose own interface back does not match.
    #[error("dangling or mismatched neighbor interface: {0} -> {1}")]
    DanglingRouter(RouterId, RouterId),
    /// A host's address does not resolve to a declared AS.
    #[error("host address references unknown AS: {0}")]
    HostWithoutAs(String),
    /// A router referenced by a registered path does not exist in the topology.
    #[error("router in registered path does not exist: {0}")]
    UnknownRouterInPath(RouterId),
    /// A stored or in-flight path repeats an AS, violating the loop-free
    /// invariant. This indicates a bug in beacon propagation, not bad input.
    #[error("AS repeated in path (loop-free invariant violated): {0:?}")]
    AsRepeatedInPath(Vec<AsId>),
    /// The topology file could not be parsed.
    #[error("malformed topology file: {0}")]
    MalformedTopology(String),
    /// The traffic file could not be parsed.
    #[error("malformed traffic file: {0}")]
    MalformedTraffic(String),
}
