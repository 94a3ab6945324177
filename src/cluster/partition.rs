// Copyright 2013-2020 Aerospike, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use crate::cluster::node::Node;
use crate::errors::{Error, Result};
use crate::key::Key;
use crate::net::{info, Connection};

/// Default partition count used until the cluster's real count is learned
/// via an info "partitions" request.
pub const DEFAULT_PARTITION_COUNT: usize = 4096;

// "replicas-all" yields a bitmap per replica rank per namespace and would
// need rank-aware parsing to pick out rank 0 (master) safely; "replicas-master"
// is the simpler info key that already returns exactly one master-only bitmap
// per namespace, which is all this table ever stores.
const REPLICAS_NAME: &str = "replicas-master";

/// A single `(namespace, partition-id)` coordinate, derived from a key's
/// digest by taking its first two bytes as an unsigned little-endian
/// 16-bit value modulo the partition count.
#[derive(Debug, Clone)]
pub struct Partition {
    pub namespace: String,
    pub partition_id: usize,
}

impl Partition {
    pub fn new(namespace: impl Into<String>, partition_id: usize) -> Self {
        Partition {
            namespace: namespace.into(),
            partition_id,
        }
    }

    pub fn from_key(key: &Key, partition_count: usize) -> Self {
        let id = u16::from_le_bytes([key.digest[0], key.digest[1]]) as usize % partition_count;
        Partition::new(key.namespace.clone(), id)
    }
}

impl PartialEq for Partition {
    fn eq(&self, other: &Partition) -> bool {
        self.namespace == other.namespace && self.partition_id == other.partition_id
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.partition_id)
    }
}

/// Per-namespace table of which node owns each partition (master replica
/// only; this core never routes to a non-master replica). Replaced
/// wholesale by the tend loop under copy-on-write discipline.
#[derive(Debug, Default)]
pub struct PartitionTable {
    map: RwLock<HashMap<String, Vec<Option<Arc<Node>>>>>,
}

impl PartitionTable {
    pub fn new() -> Self {
        PartitionTable {
            map: RwLock::new(HashMap::new()),
        }
    }

    pub fn get_node(&self, partition: &Partition) -> Option<Arc<Node>> {
        let map = self.map.read().unwrap();
        map.get(&partition.namespace)
            .and_then(|table| table.get(partition.partition_id))
            .and_then(|slot| slot.clone())
    }

    pub fn contains_node(&self, node: &Arc<Node>) -> bool {
        let map = self.map.read().unwrap();
        map.values()
            .any(|table| table.iter().any(|slot| matches!(slot, Some(n) if Arc::ptr_eq(n, node))))
    }

    /// Fetches `replicas-master` from `node` and writes every partition bit
    /// it claims (master-owned partitions only) into the table, growing
    /// per-namespace vectors to `partition_count` lazily.
    pub fn update(
        &self,
        conn: &mut Connection,
        node: &Arc<Node>,
        partition_count: usize,
    ) -> Result<()> {
        let info_map = info(conn, &[REPLICAS_NAME])?;
        let buffer = info_map
            .get(REPLICAS_NAME)
            .ok_or_else(|| Error::bad_response("missing replicas-master info"))?;

        let mut map = self.map.write().unwrap();
        for part in buffer.trim_end().split(';').filter(|s| !s.is_empty()) {
            let (ns, encoded) = part
                .split_once(':')
                .ok_or_else(|| Error::bad_response("malformed replicas-master entry"))?;
            let restore = base64::decode(encoded)?;
            let entry = map
                .entry(ns.to_string())
                .or_insert_with(|| vec![None; partition_count]);
            if entry.len() < partition_count {
                entry.resize(partition_count, None);
            }
            for (idx, slot) in entry.iter_mut().enumerate() {
                let byte = idx >> 3;
                if byte >= restore.len() {
                    continue;
                }
                if restore[byte] & (0x80 >> (idx & 7)) != 0 {
                    *slot = Some(node.clone());
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn partition_id_is_derived_from_first_two_digest_bytes() {
        let key = Key::new("test", "demo", Value::from(1i64)).unwrap();
        let expected = u16::from_le_bytes([key.digest[0], key.digest[1]]) as usize % 4096;
        let partition = Partition::from_key(&key, 4096);
        assert_eq!(partition.partition_id, expected);
        assert_eq!(partition.namespace, "test");
    }

    #[test]
    fn empty_table_returns_no_node() {
        let table = PartitionTable::new();
        let partition = Partition::new("test", 7);
        assert!(table.get_node(&partition).is_none());
    }
}
