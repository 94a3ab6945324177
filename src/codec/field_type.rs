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

// FieldType signifies the type of a length-prefixed field in a cluster
// message. The numbers align with the server-side proto.h.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[doc(hidden)]
pub enum FieldType {
    Namespace = 0,
    Table = 1,
    Key = 2,
    DigestRipe = 4,
    DigestRipeArray = 6,
    BatchIndex = 0x11,
}

impl FieldType {
    pub(crate) fn from_u8(val: u8) -> Option<FieldType> {
        match val {
            0 => Some(FieldType::Namespace),
            1 => Some(FieldType::Table),
            2 => Some(FieldType::Key),
            4 => Some(FieldType::DigestRipe),
            6 => Some(FieldType::DigestRipeArray),
            0x11 => Some(FieldType::BatchIndex),
            _ => None,
        }
    }
}
