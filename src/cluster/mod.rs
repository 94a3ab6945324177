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

//! Cluster membership: seeding, the tend loop, and the partition map it
//! maintains.

mod node;
mod node_validator;
mod partition;
mod snapshot;

pub use node::Node;
pub use partition::{Partition, PartitionTable, DEFAULT_PARTITION_COUNT};
pub use snapshot::{Nodes, Snapshot};

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex, RwLock};
use std::thread;
use std::time::{Duration, Instant};

use node_validator::NodeValidator;

use crate::batch::{batch_execute, BatchRead};
use crate::errors::{Error, Result};
use crate::host::Host;
use crate::policy::{BatchPolicy, ClientPolicy};
use crate::workers::WorkerPool;

/// The process-wide handle: seeds, the published nodes snapshot, the
/// partition map and the tend-thread controls. Cheap to clone (it is
/// always held as `Arc<Cluster>`); all mutable state lives behind locks or
/// atomics internally.
#[derive(Debug)]
pub struct Cluster {
    client_policy: ClientPolicy,
    seeds: RwLock<Vec<Host>>,
    aliases: RwLock<HashMap<Host, Arc<Node>>>,
    nodes: Nodes,
    partition_table: PartitionTable,
    partition_count: AtomicUsize,
    node_index: AtomicUsize,
    tend_valid: AtomicBool,
    tend_channel: Mutex<Sender<()>>,
    worker_pool: WorkerPool,
}

impl Cluster {
    /// Resolves the seed hosts, blocks until the node count stabilizes (or
    /// the client timeout elapses), then starts the background tend
    /// thread.
    pub fn new(client_policy: ClientPolicy, hosts: &[Host]) -> Result<Arc<Self>> {
        let (tx, rx) = mpsc::channel();
        let worker_pool = WorkerPool::new(client_policy.thread_pool_size);
        let cluster = Arc::new(Cluster {
            client_policy,
            seeds: RwLock::new(hosts.to_vec()),
            aliases: RwLock::new(HashMap::new()),
            nodes: Nodes::new(),
            partition_table: PartitionTable::new(),
            partition_count: AtomicUsize::new(0),
            node_index: AtomicUsize::new(0),
            tend_valid: AtomicBool::new(true),
            tend_channel: Mutex::new(tx),
            worker_pool,
        });

        cluster.wait_till_stabilized();

        if cluster.client_policy.fail_if_not_connected && !cluster.is_connected() {
            return Err(Error::connection(
                "failed to connect to host(s); the network connection(s) to cluster nodes may \
                 have timed out, or the cluster may be in a state of flux",
            ));
        }

        let tend_cluster = cluster.clone();
        thread::spawn(move || tend_cluster.tend_thread(rx));

        Ok(cluster)
    }

    pub fn client_policy(&self) -> &ClientPolicy {
        &self.client_policy
    }

    pub fn is_connected(&self) -> bool {
        !self.nodes.is_empty() && self.tend_valid.load(Ordering::Relaxed)
    }

    pub fn nodes(&self) -> Vec<Arc<Node>> {
        self.nodes.reserve().nodes.clone()
    }

    pub fn partition_table(&self) -> &PartitionTable {
        &self.partition_table
    }

    pub fn worker_pool(&self) -> &WorkerPool {
        &self.worker_pool
    }

    /// The batch entry point (spec §4.8): routes every key to its owning
    /// node, fans the per-node requests out across the worker pool (or
    /// runs them on the caller's thread per `policy.concurrency`), and
    /// writes each key's outcome back into `reads` at its original offset.
    pub fn batch_execute(&self, policy: &BatchPolicy, reads: &mut [BatchRead]) -> Result<()> {
        batch_execute(self, policy, reads)
    }

    /// Looks up the owning node for `partition`, falling back to a
    /// round-robin active node when the slot is empty (new namespace,
    /// mid-rebalance, or a map that has not been fetched yet).
    pub fn get_node(&self, partition: &Partition) -> Result<Arc<Node>> {
        if let Some(node) = self.partition_table.get_node(partition) {
            return Ok(node);
        }
        self.get_random_node()
    }

    pub fn get_random_node(&self) -> Result<Arc<Node>> {
        let nodes = self.nodes();
        if nodes.is_empty() {
            return Err(Error::invalid_node("cluster has no active nodes"));
        }
        let len = nodes.len();
        for _ in 0..len {
            let idx = self.node_index.fetch_add(1, Ordering::Relaxed) % len;
            if nodes[idx].is_active() {
                return Ok(nodes[idx].clone());
            }
        }
        Err(Error::invalid_node("no active node found"))
    }

    fn wait_till_stabilized(&self) {
        let timeout = self.client_policy.timeout.unwrap_or(Duration::from_secs(3));
        let deadline = Instant::now() + timeout;
        let mut last_count: isize = -1;
        loop {
            if let Err(e) = self.tend() {
                log::error!("tend failed during startup: {}", e);
            }
            let count = self.nodes().len() as isize;
            if count == last_count || Instant::now() > deadline {
                break;
            }
            last_count = count;
            thread::sleep(Duration::from_millis(1));
        }
    }

    fn tend_thread(&self, rx: Receiver<()>) {
        let interval = self.client_policy.tend_interval();
        loop {
            match rx.try_recv() {
                Err(TryRecvError::Empty) => {
                    if let Err(e) = self.tend() {
                        log::error!("tend failed: {}", e);
                    }
                    thread::sleep(interval);
                }
                _ => break,
            }
        }
        self.tend_valid.store(false, Ordering::Relaxed);
        for node in self.nodes() {
            node.close();
        }
        self.nodes.publish(vec![]);
    }

    /// One tend iteration, steps as numbered in the component design this
    /// loop follows.
    fn tend(&self) -> Result<()> {
        self.nodes.collect_garbage(self.client_policy.tend_interval());

        if self.nodes.is_empty() {
            log::debug!("no connections available, seeding");
            self.seed_nodes()?;
        }

        if self.partition_count.load(Ordering::Relaxed) == 0 {
            self.discover_partition_count()?;
        }

        let nodes = self.nodes();
        for node in &nodes {
            node.reset_friends();
        }

        let mut friend_list: Vec<Host> = vec![];
        let mut refresh_count = 0usize;
        let current_aliases = self.aliases.read().unwrap().clone();

        for node in &nodes {
            if !node.is_active() {
                continue;
            }
            let old_gen = node.partition_generation();
            match node.refresh(&current_aliases) {
                Ok(friends) => {
                    refresh_count += 1;
                    friend_list.extend(friends);
                    if old_gen != node.partition_generation() {
                        self.update_partitions(node)?;
                    }
                }
                Err(e) => {
                    node.increase_failures();
                    log::warn!("node `{}` refresh failed: {}", node, e);
                }
            }
        }

        let add_list = self.find_new_nodes_to_add(friend_list)?;
        let remove_list = self.find_nodes_to_remove(&nodes, refresh_count)?;

        if !add_list.is_empty() || !remove_list.is_empty() {
            self.apply_membership_change(add_list, remove_list)?;
        }

        Ok(())
    }

    fn discover_partition_count(&self) -> Result<()> {
        let node = match self.get_random_node() {
            Ok(node) => node,
            Err(_) => return Ok(()),
        };
        let info_map = node.info(&["partitions"])?;
        if let Some(value) = info_map.get("partitions") {
            let count: usize = value.parse()?;
            self.partition_count.store(count, Ordering::Relaxed);
        }
        Ok(())
    }

    pub fn partition_count(&self) -> usize {
        match self.partition_count.load(Ordering::Relaxed) {
            0 => DEFAULT_PARTITION_COUNT,
            n => n,
        }
    }

    fn update_partitions(&self, node: &Arc<Node>) -> Result<()> {
        let mut conn = node.get_connection(None)?;
        let result = self
            .partition_table
            .update(&mut conn, node, self.partition_count());
        match result {
            Ok(()) => {
                node.put_connection(conn);
                Ok(())
            }
            Err(e) => {
                node.invalidate_connection(conn);
                Err(e)
            }
        }
    }

    fn seed_nodes(&self) -> Result<bool> {
        let seeds = self.seeds.read().unwrap().clone();
        log::info!("seeding the cluster, seed count: {}", seeds.len());

        let mut added = vec![];
        for seed in &seeds {
            let nv = match NodeValidator::validate(&self.client_policy, seed) {
                Ok(nv) => nv,
                Err(e) => {
                    log::error!("seed {} failed: {}", seed, e);
                    continue;
                }
            };
            if !added.iter().any(|n: &Arc<Node>| n.name() == nv.name)
                && self.find_node_by_name(&nv.name).is_none()
            {
                let node = Arc::new(Node::new(self.client_policy.clone(), &nv));
                added.push(node);
            }
        }

        if added.is_empty() {
            return Ok(false);
        }
        self.apply_membership_change(added, vec![])?;
        Ok(true)
    }

    fn find_node_by_name(&self, name: &str) -> Option<Arc<Node>> {
        self.nodes().into_iter().find(|n| n.name() == name)
    }

    fn find_new_nodes_to_add(&self, hosts: Vec<Host>) -> Result<Vec<Arc<Node>>> {
        let mut result = vec![];
        for host in hosts {
            let nv = match NodeValidator::validate(&self.client_policy, &host) {
                Ok(nv) => nv,
                Err(e) => {
                    log::error!("add node {} failed: {}", host, e);
                    continue;
                }
            };

            if let Some(existing) = self.find_node_by_name(&nv.name) {
                existing.add_alias(host);
                continue;
            }
            if let Some(existing) = result.iter().find(|n: &&Arc<Node>| n.name() == nv.name) {
                existing.add_alias(host);
                continue;
            }

            result.push(Arc::new(Node::new(self.client_policy.clone(), &nv)));
        }
        Ok(result)
    }

    /// Implements the tiered removal policy: inactive nodes always go;
    /// beyond that the threshold depends on how many nodes the cluster
    /// currently has.
    fn find_nodes_to_remove(
        &self,
        nodes: &[Arc<Node>],
        refresh_count: usize,
    ) -> Result<Vec<Arc<Node>>> {
        let mut remove_list = vec![];
        let cluster_size = nodes.len();

        for node in nodes {
            if !node.is_active() {
                remove_list.push(node.clone());
                continue;
            }

            match cluster_size {
                1 => {
                    if node.failures() >= 5 && self.seed_nodes()? {
                        remove_list.push(node.clone());
                    }
                }
                2 => {
                    if refresh_count >= 1 && node.friends() == 0 && node.failures() > 0 {
                        remove_list.push(node.clone());
                    }
                }
                _ => {
                    if refresh_count >= 2 && node.friends() == 0 {
                        if node.failures() > 0 || !self.partition_table.contains_node(node) {
                            remove_list.push(node.clone());
                        }
                    }
                }
            }
        }

        Ok(remove_list)
    }

    fn apply_membership_change(&self, add: Vec<Arc<Node>>, remove: Vec<Arc<Node>>) -> Result<()> {
        let mut aliases = self.aliases.write().unwrap();
        for node in &add {
            for alias in node.aliases() {
                aliases.insert(alias, node.clone());
            }
        }
        for node in &remove {
            for alias in node.aliases() {
                aliases.remove(&alias);
            }
        }
        drop(aliases);

        for node in &remove {
            node.close();
        }

        let mut current = self.nodes();
        current.retain(|n| !remove.iter().any(|r| Arc::ptr_eq(n, r)));
        current.extend(add);
        self.nodes.publish(current);
        Ok(())
    }

    /// Signals the tend thread to stop and closes every node. The thread
    /// itself performs the close once it observes the channel disconnect.
    pub fn close(&self) {
        let tx = self.tend_channel.lock().unwrap();
        drop(tx.send(()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_count_falls_back_to_default() {
        let cluster = Cluster {
            client_policy: ClientPolicy::default(),
            seeds: RwLock::new(vec![]),
            aliases: RwLock::new(HashMap::new()),
            nodes: Nodes::new(),
            partition_table: PartitionTable::new(),
            partition_count: AtomicUsize::new(0),
            node_index: AtomicUsize::new(0),
            tend_valid: AtomicBool::new(true),
            tend_channel: Mutex::new(mpsc::channel().0),
            worker_pool: WorkerPool::new(1),
        };
        assert_eq!(cluster.partition_count(), DEFAULT_PARTITION_COUNT);
    }

    #[test]
    fn get_random_node_errs_on_empty_cluster() {
        let cluster = Cluster {
            client_policy: ClientPolicy::default(),
            seeds: RwLock::new(vec![]),
            aliases: RwLock::new(HashMap::new()),
            nodes: Nodes::new(),
            partition_table: PartitionTable::new(),
            partition_count: AtomicUsize::new(0),
            node_index: AtomicUsize::new(0),
            tend_valid: AtomicBool::new(true),
            tend_channel: Mutex::new(mpsc::channel().0),
            worker_pool: WorkerPool::new(1),
        };
        assert!(cluster.get_random_node().is_err());
    }
}
