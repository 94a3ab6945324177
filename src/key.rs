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

use std::fmt;

use ripemd::{Digest, Ripemd160};
#[cfg(feature = "serialization")]
use serde::Serialize;

use crate::errors::Result;
use crate::value::Value;

/// Unique record identifier. Records are identified using a namespace, a set
/// name and a user-defined key value which must be unique within the set, or
/// by `namespace`/`digest` alone, which is the combination used on the wire.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct Key {
    /// Namespace.
    pub namespace: String,

    /// Set name. Empty string means the default (null) set.
    pub set_name: String,

    /// Original user key, when known. A key constructed from a bare digest
    /// (as happens when reconstructing from a batch response) has `None`
    /// here.
    pub user_key: Option<Value>,

    /// Server hash value generated from the set name and user key. This is
    /// what actually routes the key to a partition and node.
    pub digest: [u8; 20],
}

impl Key {
    /// Constructs a new key given a namespace, a set name and a user key
    /// value, computing its digest.
    ///
    /// Only integers, strings and blobs can be used as user keys; any other
    /// value type fails with [`crate::errors::Error::InvalidArgument`].
    pub fn new<S>(namespace: S, set_name: S, key: Value) -> Result<Self>
    where
        S: Into<String>,
    {
        let mut key = Key {
            namespace: namespace.into(),
            set_name: set_name.into(),
            digest: [0; 20],
            user_key: Some(key),
        };
        key.compute_digest()?;
        Ok(key)
    }

    /// Constructs a key directly from a pre-computed digest, as happens when
    /// the original user key is not retained (e.g. when reconstructing a key
    /// from a batch response that only carried the digest back).
    pub fn from_digest<S>(namespace: S, set_name: S, digest: [u8; 20]) -> Self
    where
        S: Into<String>,
    {
        Key {
            namespace: namespace.into(),
            set_name: set_name.into(),
            digest,
            user_key: None,
        }
    }

    fn compute_digest(&mut self) -> Result<()> {
        let mut hash = Ripemd160::new();
        hash.update(self.set_name.as_bytes());
        match &self.user_key {
            Some(user_key) => {
                hash.update([user_key.particle_type() as u8]);
                user_key.write_key_bytes(&mut hash)?;
            }
            None => unreachable!("compute_digest called without a user key"),
        }
        self.digest = hash.finalize().into();
        Ok(())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.user_key {
            Some(value) => write!(
                f,
                "<Key: ns=\"{}\", set=\"{}\", key=\"{}\">",
                self.namespace, self.set_name, value
            ),
            None => write!(
                f,
                "<Key: ns=\"{}\", set=\"{}\", digest={}>",
                self.namespace,
                self.set_name,
                hex_digest(&self.digest)
            ),
        }
    }
}

fn hex_digest(digest: &[u8; 20]) -> String {
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Constructs a new key given a namespace, a set name and a user key.
///
/// # Panics
///
/// Only integers, strings and blobs can be used as user keys; the macro
/// panics if any other value type is passed, or if digest computation fails.
#[macro_export]
macro_rules! as_key {
    ($ns:expr, $set:expr, $val:expr) => {{
        $crate::Key::new($ns, $set, $crate::Value::from($val)).unwrap()
    }};
}

#[cfg(test)]
mod tests {
    use std::str;

    macro_rules! digest {
        ($x:expr) => {
            hex::encode(as_key!("namespace", "set", $x).digest)
        };
    }
    macro_rules! str_repeat {
        ($c:expr, $n:expr) => {
            str::from_utf8(&[$c as u8; $n]).unwrap()
        };
    }

    #[test]
    fn int_keys() {
        assert_eq!(digest!(0i64), "93d943aae37b017ad7e011b0c1d2e2143c2fb37d");
        assert_eq!(digest!(-1i64), "22116d253745e29fc63fdf760b6e26f7e197e01d");
        assert_eq!(digest!(1i8), "82d7213b469812947c109a6d341e3b5b1dedec1f");
        assert_eq!(digest!(1u8), "82d7213b469812947c109a6d341e3b5b1dedec1f");
        assert_eq!(digest!(1i32), "82d7213b469812947c109a6d341e3b5b1dedec1f");
    }

    #[test]
    fn string_keys() {
        assert_eq!(digest!(""), "2819b1ff6e346a43b4f5f6b77a88bc3eaac22a83");
        assert_eq!(
            digest!(str_repeat!('s', 1)),
            "607cddba7cd111745ef0a3d783d57f0e83c8f311"
        );
        assert_eq!(digest!("haha"), "36eb02a807dbade8cd784e7800d76308b4e89212");
    }

    #[test]
    fn blob_keys() {
        assert_eq!(
            digest!(vec![0u8; 0]),
            "327e2877b8815c7aeede0d5a8620d4ef8df4a4b4"
        );
        assert_eq!(
            digest!(vec![b's'; 1]),
            "ca2d96dc9a184d15a7fa2927565e844e9254e001"
        );
    }

    #[test]
    fn digest_is_stable_for_same_inputs() {
        let a = as_key!("namespace", "set", 42i64);
        let b = as_key!("namespace", "set", 42i64);
        assert_eq!(a.digest, b.digest);
    }

    #[test]
    fn from_digest_has_no_user_key() {
        let k = crate::Key::from_digest("ns", "set", [7u8; 20]);
        assert!(k.user_key.is_none());
        assert_eq!(k.digest, [7u8; 20]);
    }
}
