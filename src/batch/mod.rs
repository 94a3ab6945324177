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

//! The batch dispatch engine: group keys by owning node, fan the per-node
//! requests out across the worker pool, stream-parse the replies and
//! aggregate them back into the caller's original key order.

mod executor;
mod protocol;

pub use executor::batch_execute;

use std::collections::HashMap;

use crate::key::Key;
use crate::result_code::ResultCode;
use crate::value::Value;

/// Which bins a batch read should return for a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinSelector {
    /// Return every bin (`INFO1_GET_ALL`).
    All,
    /// Return only the named bins.
    Some(Vec<String>),
    /// Return no bin data at all, just existence/metadata (`INFO1_NOBINDATA`).
    None,
}

/// A single key's outcome in a batch read. Constructed with `record: None`
/// and `error: None`; a worker fills in exactly one of `record` (found),
/// leaves both `None` (not found), or sets `error` (server error) once its
/// node's reply for this offset is parsed.
#[derive(Debug, Clone)]
pub struct BatchRead {
    pub key: Key,
    pub bins: BinSelector,
    pub record: Option<Record>,
    pub error: Option<ResultCode>,
}

impl BatchRead {
    pub fn new(key: Key, bins: BinSelector) -> Self {
        BatchRead {
            key,
            bins,
            record: None,
            error: None,
        }
    }

    pub fn found(&self) -> bool {
        self.record.is_some()
    }
}

/// A record as reconstructed from a batch response: its bins, the
/// generation and time-to-live the server reported, and the key if the
/// wire message carried one back (it usually only carries the digest).
#[derive(Debug, Clone)]
pub struct Record {
    pub key: Option<Key>,
    pub bins: HashMap<String, Value>,
    pub generation: u32,
    pub expiration: u32,
}
