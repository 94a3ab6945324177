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

//! Drives a batch read to completion: groups keys by owning node, dispatches
//! one request per node (sequentially or across the worker pool) and folds
//! the results back into the caller's `reads` slice.
//!
//! Per-node work is built as an owned, self-contained task ahead of
//! dispatch and reports its outcome back through a channel rather than
//! mutating anything shared: there is no retry counter or partial-failure
//! flag a concurrent task would need to coordinate over.

use std::collections::HashMap;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Instant;

use crate::batch::protocol::{self, ParsedEntry};
use crate::batch::BatchRead;
use crate::cluster::{Cluster, Node, Partition};
use crate::errors::{Error, Result};
use crate::policy::{BatchPolicy, Concurrency};

struct NodeGroup {
    node: Arc<Node>,
    offsets: Vec<usize>,
    indexed: bool,
}

struct GroupResult {
    entries: Vec<ParsedEntry>,
    error: Option<Error>,
}

/// Executes `reads` against `cluster`, writing each key's record or error
/// back into its slot. Returns the first error encountered across every
/// node's response, if any, after writing back every record that was
/// recovered before that error occurred.
pub(crate) fn batch_execute(cluster: &Cluster, policy: &BatchPolicy, reads: &mut [BatchRead]) -> Result<()> {
    if reads.is_empty() {
        return Ok(());
    }
    if cluster.nodes().is_empty() {
        return Err(Error::ClusterEmpty);
    }

    let snapshot: Arc<Vec<BatchRead>> = Arc::new(reads.to_vec());
    let groups = group_by_node(cluster, &snapshot, policy)?;

    // A single-node batch never benefits from the worker pool, so it always
    // runs inline regardless of the requested concurrency.
    let results = if groups.len() <= 1 {
        run_sequential(policy, &snapshot, &groups)
    } else {
        match policy.concurrency {
            Concurrency::Sequential => run_sequential(policy, &snapshot, &groups),
            Concurrency::Parallel => run_parallel(cluster, policy, &snapshot, &groups),
        }
    };

    let mut first_error = None;
    for result in results {
        for entry in result.entries {
            if let Some(read) = reads.get_mut(entry.offset) {
                read.record = entry.record;
                read.error = entry.error;
            }
        }
        if first_error.is_none() {
            first_error = result.error;
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn group_by_node(cluster: &Cluster, reads: &[BatchRead], policy: &BatchPolicy) -> Result<Vec<NodeGroup>> {
    let mut by_node: HashMap<Arc<Node>, Vec<usize>> = HashMap::new();
    for (offset, read) in reads.iter().enumerate() {
        let partition = Partition::from_key(&read.key, cluster.partition_count());
        let node = cluster
            .get_node(&partition)
            .map_err(|_| Error::NoNodeForKey(read.key.to_string()))?;
        by_node.entry(node).or_default().push(offset);
    }

    let mut groups = Vec::with_capacity(by_node.len());
    for (node, offsets) in by_node {
        let indexed = node.supports_batch_index() && !policy.use_batch_direct;
        if !indexed {
            validate_single_namespace(reads, &offsets)?;
        }
        groups.push(NodeGroup { node, offsets, indexed });
    }
    Ok(groups)
}

fn validate_single_namespace(reads: &[BatchRead], offsets: &[usize]) -> Result<()> {
    let first_ns = &reads[offsets[0]].key.namespace;
    if offsets[1..]
        .iter()
        .any(|&o| &reads[o].key.namespace != first_ns)
    {
        return Err(Error::MultipleNamespaces);
    }
    Ok(())
}

fn run_sequential(policy: &BatchPolicy, reads: &[BatchRead], groups: &[NodeGroup]) -> Vec<GroupResult> {
    groups
        .iter()
        .map(|group| dispatch_to_node(policy, reads, group))
        .collect()
}

fn run_parallel(
    cluster: &Cluster,
    policy: &BatchPolicy,
    reads: &Arc<Vec<BatchRead>>,
    groups: &[NodeGroup],
) -> Vec<GroupResult> {
    let (tx, rx) = mpsc::channel::<GroupResult>();
    let wg = crate::workers::WaitGroup::new();

    for group in groups {
        let node = group.node.clone();
        let offsets = group.offsets.clone();
        let indexed = group.indexed;
        let reads = reads.clone();
        let policy = policy.clone();
        let tx = tx.clone();

        cluster.worker_pool().spawn(wg.clone(), move || {
            let group = NodeGroup { node, offsets, indexed };
            let result = dispatch_to_node(&policy, &reads, &group);
            // the receiver always outlives every sender clone here, since
            // this closure's tx is dropped only after send completes
            let _ = tx.send(result);
        });
    }
    drop(tx);
    wg.wait();

    rx.try_iter().collect()
}

/// Opens a connection, writes the request, and stream-parses the reply for
/// a single node's share of the batch. Connection failures and decode
/// errors both surface as `GroupResult.error` with no entries; a server
/// error encountered partway through the reply surfaces alongside whatever
/// entries were already parsed.
fn dispatch_to_node(policy: &BatchPolicy, reads: &[BatchRead], group: &NodeGroup) -> GroupResult {
    let deadline = policy.timeout.map(|t| Instant::now() + t);
    let mut conn = match group.node.get_connection(deadline) {
        Ok(conn) => conn,
        Err(e) => return GroupResult { entries: vec![], error: Some(e) },
    };

    if let Err(e) = conn.set_timeout(policy.timeout) {
        group.node.invalidate_connection(conn);
        return GroupResult { entries: vec![], error: Some(e) };
    }

    let request = if group.indexed {
        protocol::encode_indexed(policy, reads, &group.offsets)
    } else {
        protocol::encode_direct(policy, reads, &group.offsets)
    };

    if let Err(e) = conn.write(request.as_slice()) {
        group.node.invalidate_connection(conn);
        return GroupResult { entries: vec![], error: Some(e) };
    }

    match protocol::parse_responses(&mut conn, reads, &group.offsets, group.indexed) {
        Ok((entries, error)) => {
            group.node.put_connection(conn);
            GroupResult { entries, error }
        }
        Err(e) => {
            group.node.invalidate_connection(conn);
            GroupResult { entries: vec![], error: Some(e) }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::BinSelector;
    use crate::key::Key;
    use crate::value::Value;

    fn read(ns: &str, n: i64) -> BatchRead {
        BatchRead::new(Key::new(ns, "set", Value::from(n)).unwrap(), BinSelector::All)
    }

    #[test]
    fn validate_single_namespace_passes_for_uniform_keys() {
        let reads = vec![read("test", 1), read("test", 2)];
        assert!(validate_single_namespace(&reads, &[0, 1]).is_ok());
    }

    #[test]
    fn validate_single_namespace_rejects_mixed_namespaces() {
        let reads = vec![read("test", 1), read("other", 2)];
        assert!(matches!(
            validate_single_namespace(&reads, &[0, 1]),
            Err(Error::MultipleNamespaces)
        ));
    }

    #[test]
    fn group_result_aggregation_keeps_first_error_and_all_entries() {
        let ok_group = GroupResult {
            entries: vec![ParsedEntry { offset: 0, record: None, error: None }],
            error: None,
        };
        let failed_group = GroupResult {
            entries: vec![ParsedEntry { offset: 1, record: None, error: None }],
            error: Some(Error::ClusterEmpty),
        };

        let mut first_error = None;
        let mut written = vec![];
        for result in vec![ok_group, failed_group] {
            for entry in result.entries {
                written.push(entry.offset);
            }
            if first_error.is_none() {
                first_error = result.error;
            }
        }

        assert_eq!(written, vec![0, 1]);
        assert!(matches!(first_error, Some(Error::ClusterEmpty)));
    }
}
