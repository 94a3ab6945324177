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

//! Wire codec: frame headers, cluster message headers, field/operation
//! encoding and decoding, and zlib decompression for compressed frames.

mod buffer;
mod compress;
mod field_type;
mod particle_type;

pub use buffer::{Buffer, FrameHeader};
pub use field_type::FieldType;
pub use particle_type::ParticleType;

pub(crate) use buffer::{
    decode_field_iter, decode_op_iter, MessageHeader, BATCH_MSG_INFO, BATCH_MSG_REPEAT,
    DIGEST_SIZE, FIELD_HEADER_SIZE, INFO1_BATCH_INDEX, INFO1_CONSISTENCY_ALL, INFO1_GET_ALL,
    INFO1_NOBINDATA, INFO1_READ, INFO3_LAST, MSG_REMAINING_HEADER_SIZE, MSG_TOTAL_HEADER_SIZE,
    OPERATION_HEADER_SIZE,
};
pub(crate) use compress::inflate;
