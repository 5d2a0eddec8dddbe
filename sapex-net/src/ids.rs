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

//! Identifier newtypes.
//!
//! Unlike a flat numeric router id, SCION-style identifiers are globally unique
//! strings (`1-ff00:0:110-br1-110-1`), so these wrappers are thin `String`
//! newtypes rather than a `petgraph::NodeIndex` alias.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An AS identifier in `ISD-ASff00:ASN` form, e.g. `1-ff00:0:110`.
#[derive(Debug, Default, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AsId(pub String);

impl fmt::Display for AsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AsId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AsId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A globally unique border router identifier, e.g. `1-ff00:0:110-br1-110-1`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RouterId(pub String);

impl fmt::Display for RouterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RouterId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RouterId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl RouterId {
    /// Build the global router id `<as_id>-<router_name>` as specified by the
    /// topology file format.
    pub fn global(as_id: &AsId, router_name: &str) -> Self {
        Self(format!("{}-{}", as_id.0, router_name))
    }

    /// The AS id is recoverable as the prefix up to the last `-` segment that
    /// isn't part of the ISD-AS itself; since topology build always derives
    /// router ids from `RouterId::global`, we instead keep the owning AS
    /// alongside the router rather than parsing it back out of the string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A host identifier: the owning AS plus an address string, per `"AS,IP"` in
/// the traffic file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HostId {
    /// Owning AS.
    pub as_id: AsId,
    /// Address within the AS (opaque to the simulator).
    pub addr: String,
}

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.as_id, self.addr)
    }
}
