// Copyright 2015-2018 Aerospike, Inc.
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

use std::time::Duration;

use crate::policy::{Concurrency, ConsistencyLevel};

/// Encapsulates parameters for a batch read operation.
#[derive(Debug, Clone)]
pub struct BatchPolicy {
    /// Total transaction timeout for both client and server, used both as
    /// the per-task deadline and as the connection's socket timeout.
    /// `None` means no timeout.
    pub timeout: Option<Duration>,

    /// Maximum number of retries before the whole batch is considered
    /// failed. `batch_execute` never retries internally: a transient
    /// per-node failure surfaces in the aggregated result immediately,
    /// and retrying means the caller re-invoking the batch from scratch
    /// with fresh routing. These two fields only carry the caller's
    /// intended retry budget through the policy value; nothing in this
    /// crate reads them.
    pub max_retries: usize,

    /// Time the caller should sleep between retries it drives itself.
    pub sleep_between_retries: Duration,

    /// How replicas should be consulted to satisfy the desired consistency
    /// guarantee.
    pub consistency_level: ConsistencyLevel,

    /// Concurrency mode for the per-node fan-out.
    pub concurrency: Concurrency,

    /// Allow the batch to be processed immediately in the server's
    /// receiving thread when the server deems it appropriate.
    pub allow_inline: bool,

    /// Force the legacy direct batch protocol even for nodes that
    /// advertise indexed-batch support. Used to exercise / work around
    /// servers where indexed batch is disabled.
    pub use_batch_direct: bool,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        BatchPolicy {
            timeout: Some(Duration::from_secs(30)),
            max_retries: 2,
            sleep_between_retries: Duration::from_millis(500),
            consistency_level: ConsistencyLevel::default(),
            concurrency: Concurrency::default(),
            allow_inline: true,
            use_batch_direct: false,
        }
    }
}

impl BatchPolicy {
    /// Wire flags byte for the batch-index field's `allow-inline` /
    /// `respond-all-keys` bits.
    pub(crate) fn batch_flags(&self) -> u8 {
        let mut flags = 0;
        if self.allow_inline {
            flags |= 1;
        }
        flags
    }
}
