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

use std::collections::HashMap;
use std::str;

use byteorder::{BigEndian, WriteBytesExt};

use crate::errors::{Error, Result};
use crate::net::Connection;

const MAX_BUFFER_SIZE: usize = 1024 * 1024 + 8;

/// Sends a newline-joined list of info commands to `conn` and parses the
/// `key\tvalue` response lines into a map. Used for seed resolution, node
/// identity, partition generation checks, peer discovery and feature
/// detection; none of these are full cluster-message transactions, just
/// this lightweight text protocol.
pub fn info(conn: &mut Connection, commands: &[&str]) -> Result<HashMap<String, String>> {
    let body = commands.join("\n") + "\n";
    let request = encode(body.as_bytes());
    conn.write(&request)?;

    let mut header = [0u8; 8];
    conn.read_exact(&mut header)?;
    let data_len = u64::from_be_bytes([
        0, 0, header[2], header[3], header[4], header[5], header[6], header[7],
    ]) as usize;
    if data_len > MAX_BUFFER_SIZE {
        return Err(Error::bad_response(format!(
            "invalid size for info command buffer: {}",
            data_len
        )));
    }

    let mut body = vec![0u8; data_len];
    conn.read_exact(&mut body)?;
    parse_response(&body)
}

fn encode(data: &[u8]) -> Vec<u8> {
    let mut len = Vec::with_capacity(8);
    len.write_u64::<BigEndian>(data.len() as u64).unwrap();

    let mut buf = Vec::with_capacity(8 + data.len());
    buf.push(2); // version
    buf.push(1); // msg_type: info
    buf.extend_from_slice(&len[2..8]);
    buf.extend_from_slice(data);
    buf
}

fn parse_response(body: &[u8]) -> Result<HashMap<String, String>> {
    let response = str::from_utf8(body)?;
    let response = response.trim_matches('\n');
    let mut result = HashMap::new();
    if response.is_empty() {
        return Ok(result);
    }

    for line in response.split('\n') {
        let mut kv = line.splitn(2, '\t');
        let key = kv.next().unwrap_or("");
        let val = kv.next().unwrap_or("");
        result.insert(key.to_string(), val.to_string());
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_header_and_commands() {
        let buf = encode(b"node\n");
        assert_eq!(buf[0], 2);
        assert_eq!(buf[1], 1);
        assert_eq!(&buf[8..], b"node\n");
    }

    #[test]
    fn parses_key_value_lines() {
        let result = parse_response(b"node\tBB9.....\nfeatures\tbatch-index;geo\n").unwrap();
        assert_eq!(result.get("node").unwrap(), "BB9.....");
        assert_eq!(result.get("features").unwrap(), "batch-index;geo");
    }

    #[test]
    fn parses_empty_response() {
        let result = parse_response(b"").unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn key_with_no_value_is_empty_string() {
        let result = parse_response(b"ok\n").unwrap();
        assert_eq!(result.get("ok").unwrap(), "");
    }
}
