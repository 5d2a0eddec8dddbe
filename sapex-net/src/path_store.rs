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

//! Mapping from (src AS, dst AS) to the router-level paths registered for that
//! pair, plus the set of paths currently marked unavailable.

use std::collections::{HashMap, HashSet};

use crate::ids::{AsId, RouterId};

type AsPair = (AsId, AsId);

/// Stores every router-level path registered for each (src, dst) AS pair, in
/// registration order, and tracks which paths are currently unavailable.
#[derive(Debug, Default)]
pub struct PathStore {
    paths: HashMap<AsPair, Vec<Vec<RouterId>>>,
    unavailable: HashSet<Vec<RouterId>>,
}

impl PathStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `path` under `(src, dst)` if it is not already present
    /// (exact-sequence dedup only). Returns `true` if it was newly registered.
    pub fn register(&mut self, src: AsId, dst: AsId, path: Vec<RouterId>) -> bool {
        let entry = self.paths.entry((src, dst)).or_default();
        if entry.contains(&path) {
            false
        } else {
            entry.push(path);
            true
        }
    }

    /// All paths registered for `(src, dst)`, in registration order.
    pub fn get(&self, src: &AsId, dst: &AsId) -> &[Vec<RouterId>] {
        self.paths
            .get(&(src.clone(), dst.clone()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All (src, dst) pairs for which at least one path is registered.
    pub fn pairs(&self) -> impl Iterator<Item = &AsPair> {
        self.paths.keys()
    }

    /// Number of distinct (src, dst) entries.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// True if no entries are registered.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Mark `path` down. Idempotent. Returns the (src, dst) pairs whose list
    /// contains `path`, so callers can notify interested applications.
    pub fn mark_down(&mut self, path: &[RouterId]) -> Vec<AsPair> {
        self.unavailable.insert(path.to_vec());
        self.affected_pairs(path)
    }

    /// Mark `path` up. Idempotent (a no-op if it was already available).
    pub fn mark_up(&mut self, path: &[RouterId]) -> Vec<AsPair> {
        self.unavailable.remove(path);
        self.affected_pairs(path)
    }

    /// A path is available iff it is not in the unavailable set. Marking down
    /// an unknown path is a harmless no-op; querying availability of an
    /// unknown path reports it as available (nothing has ever marked it down).
    pub fn is_available(&self, path: &[RouterId]) -> bool {
        !self.unavailable.contains(path)
    }

    fn affected_pairs(&self, path: &[RouterId]) -> Vec<AsPair> {
        self.paths
            .iter()
            .filter(|(_, paths)| paths.iter().any(|p| p == path))
            .map(|(pair, _)| pair.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rp(names: &[&str]) -> Vec<RouterId> {
        names.iter().map(|n| RouterId::from(*n)).collect()
    }

    #[test]
    fn registering_duplicate_path_does_not_grow_list() {
        let mut store = PathStore::new();
        let src = AsId::from("A");
        let dst = AsId::from("B");
        let path = rp(&["r1", "r2"]);
        assert!(store.register(src.clone(), dst.clone(), path.clone()));
        assert!(!store.register(src.clone(), dst.clone(), path.clone()));
        assert_eq!(store.get(&src, &dst).len(), 1);
    }

    #[test]
    fn mark_down_then_up_restores_availability() {
        let mut store = PathStore::new();
        let path = rp(&["r1", "r2"]);
        assert!(store.is_available(&path));
        store.mark_down(&path);
        assert!(!store.is_available(&path));
        store.mark_down(&path);
        assert!(!store.is_available(&path));
        store.mark_up(&path);
        assert!(store.is_available(&path));
    }

    #[test]
    fn mark_down_reports_every_affected_pair() {
        let mut store = PathStore::new();
        let path = rp(&["pivot"]);
        store.register(AsId::from("L1"), AsId::from("L2"), path.clone());
        store.register(AsId::from("L2"), AsId::from("L1"), path.clone());
        store.register(AsId::from("L3"), AsId::from("L4"), rp(&["other"]));
        let mut affected = store.mark_down(&path);
        affected.sort();
        assert_eq!(
            affected,
            vec![
                (AsId::from("L1"), AsId::from("L2")),
                (AsId::from("L2"), AsId::from("L1")),
            ]
        );
    }
}
