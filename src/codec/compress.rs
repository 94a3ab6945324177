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

use std::io::Read;

use byteorder::{BigEndian, ByteOrder};
use flate2::read::ZlibDecoder;

use crate::codec::buffer::MAX_BUFFER_SIZE;
use crate::errors::{Error, Result};

/// Inflates a `CL_MSG_COMPRESSED` body. The first 8 bytes are the
/// big-endian inflated size of the payload that follows, which is itself a
/// zlib stream.
pub(crate) fn inflate(body: &[u8]) -> Result<Vec<u8>> {
    if body.len() < 8 {
        return Err(Error::truncated("compressed frame"));
    }
    let inflated_size = BigEndian::read_u64(&body[0..8]) as usize;
    if inflated_size > MAX_BUFFER_SIZE {
        return Err(Error::bad_response(format!(
            "compressed frame declares an implausible inflated size of {} bytes",
            inflated_size
        )));
    }
    if inflated_size == 0 {
        return Ok(Vec::new());
    }

    let mut out = Vec::with_capacity(inflated_size);
    let mut decoder = ZlibDecoder::new(&body[8..]);
    decoder
        .read_to_end(&mut out)
        .map_err(|e| Error::Decompress(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn inflates_a_zlib_stream() {
        let original = b"the quick brown fox jumps over the lazy dog".repeat(16);
        let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(&original).unwrap();
        let compressed = encoder.finish().unwrap();

        let mut body = Vec::new();
        let mut size_buf = [0u8; 8];
        BigEndian::write_u64(&mut size_buf, original.len() as u64);
        body.extend_from_slice(&size_buf);
        body.extend_from_slice(&compressed);

        let inflated = inflate(&body).unwrap();
        assert_eq!(inflated, original);
    }

    #[test]
    fn zero_declared_size_is_an_empty_message_list() {
        let body = [0u8; 8];
        assert_eq!(inflate(&body).unwrap(), Vec::<u8>::new());
    }
}
