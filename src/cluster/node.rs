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

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicIsize, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::cluster::node_validator::NodeValidator;
use crate::errors::{Error, Result};
use crate::host::Host;
use crate::net::{info, Connection, ConnectionPool};
use crate::policy::ClientPolicy;

/// Server representation: connection pool, liveness state and the feature
/// flags learned during validation. Cheap to share — callers hold an
/// `Arc<Node>` pulled from the current snapshot rather than talking to the
/// cluster directly.
#[derive(Debug)]
pub struct Node {
    client_policy: ClientPolicy,
    name: String,
    aliases: RwLock<Vec<Host>>,
    primary_index: AtomicUsize,

    connection_pool: ConnectionPool,
    failures: AtomicUsize,
    friends: AtomicUsize,

    partition_generation: AtomicIsize,
    refresh_count: AtomicUsize,
    reference_count: AtomicUsize,
    active: AtomicBool,

    supports_float: AtomicBool,
    supports_batch_index: AtomicBool,
    supports_replicas_all: AtomicBool,
    supports_geo: AtomicBool,
}

impl Node {
    pub fn new(client_policy: ClientPolicy, nv: &NodeValidator) -> Self {
        Node {
            client_policy: client_policy.clone(),
            name: nv.name.clone(),
            aliases: RwLock::new(nv.aliases.clone()),
            primary_index: AtomicUsize::new(0),

            connection_pool: ConnectionPool::new(client_policy.connection_pool_size_per_node),
            failures: AtomicUsize::new(0),
            friends: AtomicUsize::new(0),

            partition_generation: AtomicIsize::new(-1),
            refresh_count: AtomicUsize::new(0),
            reference_count: AtomicUsize::new(0),
            active: AtomicBool::new(true),

            supports_float: AtomicBool::new(nv.supports_float),
            supports_batch_index: AtomicBool::new(nv.supports_batch_index),
            supports_replicas_all: AtomicBool::new(nv.supports_replicas_all),
            supports_geo: AtomicBool::new(nv.supports_geo),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn client_policy(&self) -> &ClientPolicy {
        &self.client_policy
    }

    /// The address currently treated as primary among this node's known
    /// aliases (a multi-homed node may have several).
    pub fn primary_host(&self) -> Host {
        let aliases = self.aliases.read().unwrap();
        let idx = self.primary_index.load(Ordering::Relaxed).min(aliases.len().saturating_sub(1));
        aliases[idx].clone()
    }

    pub fn aliases(&self) -> Vec<Host> {
        self.aliases.read().unwrap().clone()
    }

    pub fn add_alias(&self, alias: Host) {
        let mut aliases = self.aliases.write().unwrap();
        if !aliases.contains(&alias) {
            aliases.push(alias);
        }
        self.reference_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn supports_batch_index(&self) -> bool {
        self.supports_batch_index.load(Ordering::Relaxed)
    }

    pub fn supports_replicas_all(&self) -> bool {
        self.supports_replicas_all.load(Ordering::Relaxed)
    }

    pub fn supports_float(&self) -> bool {
        self.supports_float.load(Ordering::Relaxed)
    }

    pub fn supports_geo(&self) -> bool {
        self.supports_geo.load(Ordering::Relaxed)
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    fn inactivate(&self) {
        self.active.store(false, Ordering::Relaxed);
    }

    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn increase_failures(&self) -> usize {
        self.failures.fetch_add(1, Ordering::Relaxed)
    }

    fn reset_failures(&self) {
        self.failures.store(0, Ordering::Relaxed);
    }

    /// Count of other nodes that named this node in their services list
    /// this tick. Reset by the tend loop at the start of every iteration.
    pub fn friends(&self) -> usize {
        self.friends.load(Ordering::Relaxed)
    }

    pub fn reset_friends(&self) {
        self.friends.store(0, Ordering::Relaxed);
    }

    pub fn add_friend(&self) {
        self.friends.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reference_count(&self) -> usize {
        self.reference_count.load(Ordering::Relaxed)
    }

    pub fn partition_generation(&self) -> isize {
        self.partition_generation.load(Ordering::Relaxed)
    }

    /// Borrows a pooled connection, opening a new one if the pool is empty
    /// and under capacity.
    pub fn get_connection(&self, deadline: Option<std::time::Instant>) -> Result<Connection> {
        let addr = self
            .primary_host()
            .resolve()?
            .into_iter()
            .next()
            .ok_or_else(|| Error::connection(format!("no address for node {}", self.name)))?;
        let connect_timeout = self.client_policy.timeout.unwrap_or(Duration::from_secs(1));
        self.connection_pool
            .acquire(addr, connect_timeout, self.client_policy.idle_timeout, deadline)
    }

    pub fn put_connection(&self, conn: Connection) {
        self.connection_pool.release(conn);
    }

    pub fn invalidate_connection(&self, conn: Connection) {
        self.connection_pool.discard(conn);
    }

    pub fn close(&self) {
        self.inactivate();
        self.connection_pool.close_all();
    }

    /// Sends info commands over a transient connection borrowed from this
    /// node's pool, invalidating it on failure rather than returning it to
    /// the idle queue.
    pub fn info(&self, commands: &[&str]) -> Result<HashMap<String, String>> {
        let mut conn = self.get_connection(None)?;
        match info(&mut conn, commands) {
            Ok(map) => {
                self.put_connection(conn);
                Ok(map)
            }
            Err(e) => {
                self.invalidate_connection(conn);
                Err(e)
            }
        }
    }

    const fn services_name(&self) -> &'static str {
        if self.client_policy.use_services_alternate {
            "services-alternate"
        } else {
            "services"
        }
    }

    /// Sends the single tend-tick info request and digests the reply:
    /// validates identity, harvests friend candidates (incrementing their
    /// `friends` counter if already known) and records the partition
    /// generation. Returns the set of candidate hosts not already present.
    pub fn refresh(&self, current_aliases: &HashMap<Host, Arc<Node>>) -> Result<Vec<Host>> {
        self.refresh_count.fetch_add(1, Ordering::Relaxed);
        let commands = ["node", "partition-generation", self.services_name()];
        let info_map = self.info(&commands)?;
        self.verify_node_name(&info_map)?;

        let friends = self.parse_friends(current_aliases, &info_map)?;
        self.update_partition_generation(&info_map)?;
        self.reset_failures();
        Ok(friends)
    }

    fn verify_node_name(&self, info_map: &HashMap<String, String>) -> Result<()> {
        match info_map.get("node") {
            None => Err(Error::invalid_node("missing node name in info response")),
            Some(info_name) if info_name == &self.name => Ok(()),
            Some(info_name) => {
                self.inactivate();
                Err(Error::invalid_node(format!(
                    "node name changed: '{}' => '{}'",
                    self.name, info_name
                )))
            }
        }
    }

    fn parse_friends(
        &self,
        current_aliases: &HashMap<Host, Arc<Node>>,
        info_map: &HashMap<String, String>,
    ) -> Result<Vec<Host>> {
        let mut friends = vec![];
        let friend_string = match info_map.get(self.services_name()) {
            None => return Err(Error::bad_response("missing services list")),
            Some(s) if s.is_empty() => return Ok(friends),
            Some(s) => s,
        };

        for friend in friend_string.split(';') {
            let mut parts = friend.split(':');
            let (host, port) = match (parts.next(), parts.next(), parts.next()) {
                (Some(host), Some(port), None) => (host, port),
                _ => {
                    log::error!("malformed services entry, expected HOST:PORT, got '{}'", friend);
                    continue;
                }
            };
            let port: u16 = port.parse()?;
            let name = self.client_policy.translate_address(host);
            let alias = Host::new(name, port);

            if let Some(node) = current_aliases.get(&alias) {
                node.add_friend();
            } else if !friends.contains(&alias) {
                friends.push(alias);
            }
        }

        Ok(friends)
    }

    fn update_partition_generation(&self, info_map: &HashMap<String, String>) -> Result<()> {
        match info_map.get("partition-generation") {
            None => Err(Error::bad_response("missing partition-generation")),
            Some(gen) => {
                self.partition_generation
                    .store(gen.parse::<isize>()?, Ordering::Relaxed);
                Ok(())
            }
        }
    }
}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Node) -> bool {
        self.name == other.name
    }
}

impl Eq for Node {}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.primary_host())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator(name: &str) -> NodeValidator {
        NodeValidator {
            name: name.to_string(),
            aliases: vec![Host::new("127.0.0.1", 3000)],
            supports_float: true,
            supports_batch_index: true,
            supports_replicas_all: true,
            supports_geo: false,
        }
    }

    #[test]
    fn new_node_is_active_with_no_failures() {
        let node = Node::new(ClientPolicy::default(), &validator("BB9000"));
        assert!(node.is_active());
        assert_eq!(node.failures(), 0);
        assert_eq!(node.partition_generation(), -1);
    }

    #[test]
    fn name_mismatch_rejects_and_inactivates() {
        let node = Node::new(ClientPolicy::default(), &validator("BB9000"));
        let mut info_map = HashMap::new();
        info_map.insert("node".to_string(), "OTHER".to_string());
        let err = node.verify_node_name(&info_map);
        assert!(err.is_err());
        assert!(!node.is_active());
    }

    #[test]
    fn friends_counter_resets_between_ticks() {
        let node = Node::new(ClientPolicy::default(), &validator("BB9000"));
        node.add_friend();
        node.add_friend();
        assert_eq!(node.friends(), 2);
        node.reset_friends();
        assert_eq!(node.friends(), 0);
    }
}
