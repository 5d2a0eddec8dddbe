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

//! Logical packets exchanged over links: beacons and data/probe packets.
//!
//! These are plain data, never a byte-accurate wire format (see the
//! Non-goals): a beacon clone for each neighbor fork is just a `Beacon::clone`
//! of an independent owned value, satisfying the "each clone is an independent
//! object" propagation invariant for free.

use crate::ids::{AsId, HostId, RouterId};
use crate::scheduler::Ms;
use crate::topology::LinkMetrics;

/// Which segment of a path a beacon currently represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentType {
    /// Travelling from a leaf AS towards a core AS.
    Down,
    /// Travelling core-to-core.
    Core,
    /// The reverse (leaf-to-core) view registered alongside a down/core hop.
    Up,
}

/// One hop recorded in a beacon's accumulated path.
#[derive(Debug, Clone)]
pub struct HopInfo {
    /// AS the hop was recorded at.
    pub as_id: AsId,
    /// Router the hop was recorded at.
    pub router_id: RouterId,
    /// Router id the beacon arrived from (ingress), if any.
    pub ingress: Option<RouterId>,
    /// Router id the beacon was forwarded to (egress), if any — filled in on
    /// the next hop's ingress.
    pub egress: Option<RouterId>,
    /// Metrics of the link the beacon traversed to reach this hop.
    pub link: Option<LinkMetrics>,
}

/// A path-construction beacon in flight. Beacons are cloned independently on
/// every fork to a neighbor; mutating one clone never affects another.
#[derive(Debug, Clone)]
pub struct Beacon {
    /// AS that originated this beacon.
    pub origin_as: AsId,
    /// Origination timestamp.
    pub timestamp: Ms,
    /// Accumulated hop records, in traversal order.
    pub hops: Vec<HopInfo>,
    /// Current segment type.
    pub segment_type: SegmentType,
    /// Router-level path accumulated so far.
    pub path: Vec<RouterId>,
}

impl Beacon {
    /// AS ids visited so far, derived from `hops`.
    pub fn as_sequence(&self) -> Vec<AsId> {
        self.hops.iter().map(|h| h.as_id.clone()).collect()
    }

    /// True if `as_id` already appears in this beacon's hop sequence.
    pub fn visited(&self, as_id: &AsId) -> bool {
        self.hops.iter().any(|h| &h.as_id == as_id)
    }
}

/// A data or probe packet travelling a fixed router-level path.
#[derive(Debug, Clone)]
pub struct DataPacket {
    /// Sending host.
    pub source: HostId,
    /// Receiving host.
    pub destination: HostId,
    /// Router-level path this packet follows. The current hop is found by
    /// locating `self` in this list (tie-break: first occurrence), not by a
    /// separate index, since reflection reverses the list in place.
    pub path: Vec<RouterId>,
    /// Size of the packet, in bytes.
    pub size_bytes: usize,
    /// Probe identifier, if this is a probe packet.
    pub probe_id: Option<u64>,
    /// Send timestamp, used to compute latency/RTT on arrival or reflection.
    pub timestamp: Ms,
    /// True for probe traffic (reflected at the terminal hop instead of
    /// delivered to a host).
    pub is_probe: bool,
    /// Set once a probe has been reflected at its terminal router, so the
    /// second leg of the round trip is not reflected again.
    pub returning: bool,
}

/// Anything that can travel over a [`crate::topology::Link`].
#[derive(Debug, Clone)]
pub enum Packet {
    /// A beaconing protocol message.
    Beacon(Box<Beacon>),
    /// Application data or a probe.
    Data(DataPacket),
}

impl Packet {
    /// Size of this packet in bytes, for transmission-delay purposes. Beacons
    /// are modeled as a small fixed control-plane size.
    pub fn size_bytes(&self) -> usize {
        match self {
            Packet::Beacon(_) => 128,
            Packet::Data(d) => d.size_bytes,
        }
    }
}
