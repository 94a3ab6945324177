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

/// Server particle types, as carried in the `particle_type` byte of an
/// operation on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[doc(hidden)]
pub enum ParticleType {
    NULL = 0,
    INTEGER = 1,
    FLOAT = 2,
    STRING = 3,
    BLOB = 4,
    DIGEST = 6,
    HLL = 18,
    MAP = 19,
    LIST = 20,
    GEOJSON = 23,
}

impl From<u8> for ParticleType {
    fn from(val: u8) -> ParticleType {
        match val {
            0 => ParticleType::NULL,
            1 => ParticleType::INTEGER,
            2 => ParticleType::FLOAT,
            3 => ParticleType::STRING,
            4 => ParticleType::BLOB,
            6 => ParticleType::DIGEST,
            18 => ParticleType::HLL,
            19 => ParticleType::MAP,
            20 => ParticleType::LIST,
            23 => ParticleType::GEOJSON,
            // Unknown particle types are reported as opaque blobs rather than
            // rejected outright: a batch read should not fail just because a
            // bin holds a type this core does not interpret.
            _ => ParticleType::BLOB,
        }
    }
}
