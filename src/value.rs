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

//! A minimal tagged value used for key digests and for decoding the bin
//! values returned by a batch read. This core does not implement the
//! high-level record/bin API, so only the particle types the wire protocol
//! and key digest actually need are represented; collection types are kept
//! as their raw, still-packed bytes rather than fully decoded.

use std::fmt;

use byteorder::{ByteOrder, NetworkEndian};
use ripemd::Digest;

use crate::codec::ParticleType;
use crate::errors::Error;

/// A value carried as a key's user-key component or as a bin value decoded
/// out of a batch response.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize))]
pub enum Value {
    /// Absent value — an empty bin, or a key with no stored user key.
    Nil,
    /// Integer value. All integers are carried as 64-bit numerics on the wire.
    Int(i64),
    /// Floating point value (IEEE-754 double).
    Float(f64),
    /// UTF-8 string value.
    String(String),
    /// Opaque byte array value.
    Blob(Vec<u8>),
    /// A list, map or GeoJSON value this core does not decode further; the
    /// bytes are exactly as received from the wire, still msgpack/JSON
    /// encoded as applicable.
    Raw(ParticleType, Vec<u8>),
}

impl Value {
    /// The particle type used to tag this value on the wire.
    pub fn particle_type(&self) -> ParticleType {
        match self {
            Value::Nil => ParticleType::NULL,
            Value::Int(_) => ParticleType::INTEGER,
            Value::Float(_) => ParticleType::FLOAT,
            Value::String(_) => ParticleType::STRING,
            Value::Blob(_) => ParticleType::BLOB,
            Value::Raw(t, _) => *t,
        }
    }

    /// Number of bytes this value occupies in its wire representation.
    pub fn estimate_size(&self) -> usize {
        match self {
            Value::Nil => 0,
            Value::Int(_) | Value::Float(_) => 8,
            Value::String(s) => s.len(),
            Value::Blob(b) => b.len(),
            Value::Raw(_, b) => b.len(),
        }
    }

    /// Serializes this value's key-bytes component into a RIPEMD-160 digest
    /// as the server expects: for integer keys, the 8-byte big-endian
    /// representation; for strings and blobs, the bytes verbatim.
    pub(crate) fn write_key_bytes(&self, hash: &mut ripemd::Ripemd160) -> Result<(), Error> {
        match self {
            Value::Int(v) => {
                let mut buf = [0u8; 8];
                NetworkEndian::write_i64(&mut buf, *v);
                hash.update(buf);
                Ok(())
            }
            Value::String(s) => {
                hash.update(s.as_bytes());
                Ok(())
            }
            Value::Blob(b) => {
                hash.update(b);
                Ok(())
            }
            other => Err(Error::InvalidArgument(format!(
                "{:?} is not supported as a key value",
                other.particle_type()
            ))),
        }
    }

    /// Decodes a single bin value out of its wire bytes given its particle
    /// type. Only the scalar types this core understands end-to-end are
    /// decoded; everything else is returned as `Value::Raw`.
    pub(crate) fn decode(particle_type: ParticleType, bytes: &[u8]) -> Value {
        match particle_type {
            ParticleType::NULL => Value::Nil,
            ParticleType::INTEGER if bytes.len() == 8 => {
                Value::Int(NetworkEndian::read_i64(bytes))
            }
            ParticleType::FLOAT if bytes.len() == 8 => {
                Value::Float(f64::from_bits(NetworkEndian::read_u64(bytes)))
            }
            ParticleType::STRING => {
                Value::String(String::from_utf8_lossy(bytes).into_owned())
            }
            ParticleType::BLOB => Value::Blob(bytes.to_vec()),
            other => Value::Raw(other, bytes.to_vec()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "<nil>"),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{}", v),
            Value::Blob(v) => write!(f, "{:?}", v),
            Value::Raw(t, v) => write!(f, "<{:?}: {} bytes>", t, v.len()),
        }
    }
}

impl From<i64> for Value {
    fn from(val: i64) -> Value {
        Value::Int(val)
    }
}

impl From<String> for Value {
    fn from(val: String) -> Value {
        Value::String(val)
    }
}

impl From<&str> for Value {
    fn from(val: &str) -> Value {
        Value::String(val.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(val: Vec<u8>) -> Value {
        Value::Blob(val)
    }
}

macro_rules! from_int {
    ($t:ty) => {
        impl From<$t> for Value {
            fn from(val: $t) -> Value {
                Value::Int(val as i64)
            }
        }
    };
}
from_int!(i8);
from_int!(u8);
from_int!(i16);
from_int!(u16);
from_int!(i32);
from_int!(u32);
from_int!(isize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_scalar_types() {
        let mut buf = [0u8; 8];
        NetworkEndian::write_i64(&mut buf, 42);
        assert_eq!(Value::decode(ParticleType::INTEGER, &buf), Value::Int(42));
        assert_eq!(
            Value::decode(ParticleType::STRING, b"hi"),
            Value::String("hi".to_string())
        );
        assert_eq!(
            Value::decode(ParticleType::BLOB, &[1, 2, 3]),
            Value::Blob(vec![1, 2, 3])
        );
    }

    #[test]
    fn rejects_unsupported_key_values() {
        let mut hash = ripemd::Ripemd160::new();
        assert!(Value::Nil.write_key_bytes(&mut hash).is_err());
    }
}
