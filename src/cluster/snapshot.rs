// Copyright 2015-2020 Aerospike, Inc.
//
// Portions may be licensed to Aerospike, Inc. under one or more contributor
// license agreements.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License. You may obtain a copy of
// the License at http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied. See the
// License for the specific language governing permissions and limitations under
// the License.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;

use crate::cluster::node::Node;

/// An immutable published view of the active nodes. Readers clone the
/// `Arc<Snapshot>` out of the `Nodes` handle (the equivalent of a
/// reserve/release pair: holding the `Arc` is the reservation, dropping it
/// is the release) rather than touching the shared pointer directly.
#[derive(Debug)]
pub struct Snapshot {
    pub nodes: Vec<Arc<Node>>,
    published_at: Instant,
}

impl Snapshot {
    fn new(nodes: Vec<Arc<Node>>) -> Self {
        Snapshot {
            nodes,
            published_at: Instant::now(),
        }
    }
}

/// Copy-on-write publication point for the nodes snapshot. `publish`
/// installs a new `Arc<Snapshot>` and moves the previous one onto a
/// garbage-collection list; `collect_garbage` drains entries whose
/// snapshot is both unreferenced (its only remaining `Arc` is the one
/// sitting in the list) and at least one tend interval old, matching the
/// deferred-release discipline that protects a reader which has read the
/// pointer but not yet bumped its reference count.
#[derive(Debug)]
pub struct Nodes {
    current: RwLock<Arc<Snapshot>>,
    garbage: Mutex<Vec<Arc<Snapshot>>>,
    publish_count: AtomicUsize,
}

impl Default for Nodes {
    fn default() -> Self {
        Nodes {
            current: RwLock::new(Arc::new(Snapshot::new(vec![]))),
            garbage: Mutex::new(vec![]),
            publish_count: AtomicUsize::new(0),
        }
    }
}

impl Nodes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves the current snapshot for the caller's use. The returned
    /// `Arc` keeps the array alive for as long as it is held.
    pub fn reserve(&self) -> Arc<Snapshot> {
        self.current.read().unwrap().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.reserve().nodes.is_empty()
    }

    /// Installs `nodes` as the new snapshot, deferring release of the
    /// previous one to the garbage-collection list.
    pub fn publish(&self, nodes: Vec<Arc<Node>>) {
        let new_snapshot = Arc::new(Snapshot::new(nodes));
        let old = {
            let mut current = self.current.write().unwrap();
            std::mem::replace(&mut *current, new_snapshot)
        };
        self.publish_count.fetch_add(1, Ordering::Relaxed);
        self.garbage.lock().unwrap().push(old);
    }

    /// Drops every garbage-listed snapshot that is no longer shared (the
    /// list's own `Arc` is the last one) and is older than one tend
    /// interval. Called at the start of every tend iteration.
    pub fn collect_garbage(&self, min_age: std::time::Duration) {
        let mut garbage = self.garbage.lock().unwrap();
        garbage.retain(|snap| Arc::strong_count(snap) > 1 || snap.published_at.elapsed() < min_age);
    }

    pub fn garbage_len(&self) -> usize {
        self.garbage.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_nodes_is_empty() {
        let nodes = Nodes::new();
        assert!(nodes.is_empty());
    }

    #[test]
    fn publish_replaces_snapshot_and_queues_garbage() {
        let nodes = Nodes::new();
        nodes.publish(vec![]);
        assert_eq!(nodes.garbage_len(), 1);
    }

    #[test]
    fn collect_garbage_drops_unreferenced_old_entries() {
        let nodes = Nodes::new();
        nodes.publish(vec![]);
        nodes.collect_garbage(std::time::Duration::from_secs(0));
        assert_eq!(nodes.garbage_len(), 0);
    }

    #[test]
    fn collect_garbage_keeps_still_referenced_entries() {
        let nodes = Nodes::new();
        let held = nodes.reserve();
        nodes.publish(vec![]);
        nodes.collect_garbage(std::time::Duration::from_secs(0));
        assert_eq!(nodes.garbage_len(), 1);
        drop(held);
        nodes.collect_garbage(std::time::Duration::from_secs(0));
        assert_eq!(nodes.garbage_len(), 0);
    }
}
