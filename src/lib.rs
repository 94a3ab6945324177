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

//! The cluster-membership, connection-pooling and batch-dispatch core of
//! an Aerospike client: a tend loop that keeps a partition map and node
//! list up to date, per-node connection pools, and a batch engine that
//! routes keys to the node that owns them and parses the wire replies back
//! into records.
//!
//! This crate intentionally stops short of a full client: there is no
//! high-level get/put/query/UDF API, no TLS handshake and no live-cluster
//! test harness. See the crate's README for the exact boundary.

pub use batch::{BatchRead, BinSelector, Record};
pub use cluster::{Cluster, Node};
pub use errors::{Error, Result};
pub use host::Host;
pub use key::Key;
pub use policy::{BatchPolicy, ClientPolicy, Concurrency, ConsistencyLevel};
pub use result_code::ResultCode;
pub use value::Value;

pub mod batch;
pub mod cluster;
pub mod codec;
pub mod errors;
pub mod host;
pub mod key;
pub mod net;
pub mod policy;
pub mod result_code;
pub mod value;

mod workers;
