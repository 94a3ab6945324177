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

use byteorder::{BigEndian, ByteOrder};

use crate::errors::{Error, Result};

// Contains a read operation.
pub(crate) const INFO1_READ: u8 = 1;
// Get all bins.
pub(crate) const INFO1_GET_ALL: u8 = 1 << 1;
// Do not read the bins (existence check only).
pub(crate) const INFO1_NOBINDATA: u8 = 1 << 2;
// This is a batch request.
pub(crate) const INFO1_BATCH_INDEX: u8 = 1 << 3;
// Involve all replicas in read operation.
pub(crate) const INFO1_CONSISTENCY_ALL: u8 = 1 << 6;

// This is the last message of a multi-part response.
pub(crate) const INFO3_LAST: u8 = 1;

pub(crate) const BATCH_MSG_REPEAT: u8 = 0x1;
pub(crate) const BATCH_MSG_INFO: u8 = 0x2;

// Frame header (8 bytes) + cluster message header (22 bytes).
pub(crate) const MSG_TOTAL_HEADER_SIZE: usize = 30;
pub(crate) const FIELD_HEADER_SIZE: usize = 5;
pub(crate) const OPERATION_HEADER_SIZE: usize = 8;
pub(crate) const MSG_REMAINING_HEADER_SIZE: usize = 22;
pub(crate) const DIGEST_SIZE: usize = 20;

const CL_MSG_VERSION: u8 = 2;
const AS_MSG_TYPE: u8 = 3;
const INFO_MSG_TYPE: u8 = 1;
const COMPRESSED_MSG_TYPE: u8 = 4;

/// Protects against allocating unreasonably large buffers in response to a
/// corrupted or malicious size field.
pub(crate) const MAX_BUFFER_SIZE: usize = 120 * 1024 * 1024 + 8;

/// The 8-byte frame that precedes every request/response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: u8,
    pub msg_type: u8,
    pub size: u64,
}

impl FrameHeader {
    pub(crate) fn decode(buf: &[u8]) -> Result<FrameHeader> {
        if buf.len() < 8 {
            return Err(Error::truncated("frame header"));
        }
        if buf[0] != CL_MSG_VERSION {
            return Err(Error::ProtocolVersion(buf[0]));
        }
        let mut size_buf = [0u8; 8];
        size_buf[2..8].copy_from_slice(&buf[2..8]);
        let size = BigEndian::read_u64(&size_buf);
        if size as usize > MAX_BUFFER_SIZE {
            return Err(Error::bad_response(format!(
                "frame declares an implausible size of {} bytes",
                size
            )));
        }
        Ok(FrameHeader {
            version: buf[0],
            msg_type: buf[1],
            size,
        })
    }

    pub(crate) fn is_compressed(&self) -> bool {
        self.msg_type == COMPRESSED_MSG_TYPE
    }

    pub(crate) fn is_info(&self) -> bool {
        self.msg_type == INFO_MSG_TYPE
    }
}

/// The 22-byte cluster message header that follows the frame header on an
/// `AS_MSG` body.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct MessageHeader {
    pub info1: u8,
    pub info2: u8,
    pub info3: u8,
    pub result_code: u8,
    pub generation: u32,
    pub record_ttl: u32,
    // Repurposed by the batch-index protocol to carry the original offset
    // of the key this message answers.
    pub transaction_ttl: u32,
    pub n_fields: u16,
    pub n_ops: u16,
}

impl MessageHeader {
    pub(crate) fn decode(buf: &[u8]) -> Result<MessageHeader> {
        if buf.len() < MSG_REMAINING_HEADER_SIZE {
            return Err(Error::truncated("message header"));
        }
        Ok(MessageHeader {
            info1: buf[1],
            info2: buf[2],
            info3: buf[3],
            result_code: buf[5],
            generation: BigEndian::read_u32(&buf[6..10]),
            record_ttl: BigEndian::read_u32(&buf[10..14]),
            transaction_ttl: BigEndian::read_u32(&buf[14..18]),
            n_fields: BigEndian::read_u16(&buf[18..20]),
            n_ops: BigEndian::read_u16(&buf[20..22]),
        })
    }

    pub(crate) fn is_last(&self) -> bool {
        self.info3 & INFO3_LAST == INFO3_LAST
    }
}

/// A growable write buffer used to assemble a request frame. Mirrors the
/// begin/write.../end discipline of the wire codec: `begin` reserves space
/// for the header, callers append fields and operations, and `end` patches
/// the frame size back into the first 8 bytes.
#[derive(Debug, Default)]
pub struct Buffer {
    pub(crate) data: Vec<u8>,
}

impl Buffer {
    pub fn new() -> Self {
        Buffer {
            data: Vec::with_capacity(1024),
        }
    }

    pub(crate) fn begin(&mut self) {
        self.data.clear();
        self.data.resize(MSG_TOTAL_HEADER_SIZE, 0);
    }

    /// Finalizes the frame by writing its size into the leading 8 bytes.
    pub(crate) fn end(&mut self) {
        let size = (self.data.len() - 8) as u64
            | ((CL_MSG_VERSION as u64) << 56)
            | ((AS_MSG_TYPE as u64) << 48);
        BigEndian::write_u64(&mut self.data[0..8], size);
    }

    pub(crate) fn write_message_header(
        &mut self,
        info1: u8,
        info2: u8,
        info3: u8,
        field_count: u16,
        op_count: u16,
    ) {
        self.data[8] = MSG_REMAINING_HEADER_SIZE as u8;
        self.data[9] = info1;
        self.data[10] = info2;
        self.data[11] = info3;
        self.data[12] = 0; // unused
        self.data[13] = 0; // result_code, always 0 on a request
        BigEndian::write_u32(&mut self.data[14..18], 0); // generation
        BigEndian::write_u32(&mut self.data[18..22], 0); // record_ttl
        BigEndian::write_u32(&mut self.data[22..26], 0); // transaction_ttl
        BigEndian::write_u16(&mut self.data[26..28], field_count);
        BigEndian::write_u16(&mut self.data[28..30], op_count);
    }

    pub(crate) fn write_u8(&mut self, v: u8) {
        self.data.push(v);
    }

    pub(crate) fn write_u16(&mut self, v: u16) {
        let mut buf = [0u8; 2];
        BigEndian::write_u16(&mut buf, v);
        self.data.extend_from_slice(&buf);
    }

    pub(crate) fn write_u32(&mut self, v: u32) {
        let mut buf = [0u8; 4];
        BigEndian::write_u32(&mut buf, v);
        self.data.extend_from_slice(&buf);
    }

    pub(crate) fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    pub(crate) fn write_str(&mut self, s: &str) {
        self.data.extend_from_slice(s.as_bytes());
    }

    pub(crate) fn write_field_header(&mut self, payload_len: usize, ftype: u8) {
        self.write_u32((payload_len + 1) as u32);
        self.write_u8(ftype);
    }

    pub(crate) fn write_field_string(&mut self, field: &str, ftype: u8) {
        self.write_field_header(field.len(), ftype);
        self.write_str(field);
    }

    /// Writes a zero-value read-by-name operation, as used to select
    /// specific bins in the legacy direct batch protocol's shared op list.
    pub(crate) fn write_operation_for_bin_name(&mut self, name: &str) {
        let op_size = 4 + name.len();
        self.write_u32(op_size as u32);
        self.write_u8(BATCH_OP_READ);
        self.write_u8(0); // particle_type, unused on a read-by-name request
        self.write_u8(0); // version
        self.write_u8(name.len() as u8);
        self.write_str(name);
    }

    pub(crate) fn len(&self) -> usize {
        self.data.len()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

/// Server operation code for a bin read, as carried in a legacy batch
/// request's shared operation list.
pub(crate) const BATCH_OP_READ: u8 = 1;

/// A single decoded length-prefixed field from a cluster message body.
#[derive(Debug)]
pub(crate) struct DecodedField<'a> {
    pub field_type: u8,
    pub payload: &'a [u8],
}

/// Decodes `n_fields` length-prefixed fields starting at `buf[0]`, returning
/// them along with the number of bytes consumed.
pub(crate) fn decode_field_iter(buf: &[u8], n_fields: u16) -> Result<(Vec<DecodedField<'_>>, usize)> {
    let mut offset = 0;
    let mut fields = Vec::with_capacity(n_fields as usize);
    for _ in 0..n_fields {
        if buf.len() < offset + FIELD_HEADER_SIZE {
            return Err(Error::truncated("field header"));
        }
        let size = BigEndian::read_u32(&buf[offset..offset + 4]) as usize;
        if size == 0 {
            return Err(Error::bad_response("zero-length field size"));
        }
        let field_type = buf[offset + 4];
        let payload_len = size - 1;
        let payload_start = offset + FIELD_HEADER_SIZE;
        if buf.len() < payload_start + payload_len {
            return Err(Error::truncated("field payload"));
        }
        fields.push(DecodedField {
            field_type,
            payload: &buf[payload_start..payload_start + payload_len],
        });
        offset = payload_start + payload_len;
    }
    Ok((fields, offset))
}

/// A single decoded bin operation from a cluster message body.
#[derive(Debug)]
pub(crate) struct DecodedOp<'a> {
    pub particle_type: u8,
    pub name: &'a str,
    pub value: &'a [u8],
}

/// Decodes `n_ops` bin operations starting at `buf[0]`, returning them
/// along with the number of bytes consumed.
pub(crate) fn decode_op_iter(buf: &[u8], n_ops: u16) -> Result<(Vec<DecodedOp<'_>>, usize)> {
    let mut offset = 0;
    let mut ops = Vec::with_capacity(n_ops as usize);
    for _ in 0..n_ops {
        if buf.len() < offset + OPERATION_HEADER_SIZE {
            return Err(Error::truncated("operation header"));
        }
        let op_size = BigEndian::read_u32(&buf[offset..offset + 4]) as usize;
        let particle_type = buf[offset + 5];
        let name_sz = buf[offset + 7] as usize;
        let name_start = offset + OPERATION_HEADER_SIZE;
        if op_size < 4 + name_sz || buf.len() < name_start + name_sz {
            return Err(Error::truncated("operation name"));
        }
        let name = std::str::from_utf8(&buf[name_start..name_start + name_sz])
            .map_err(|_| Error::bad_response("operation name is not valid UTF-8"))?;
        let value_len = op_size - 4 - name_sz;
        let value_start = name_start + name_sz;
        if buf.len() < value_start + value_len {
            return Err(Error::truncated("operation value"));
        }
        ops.push(DecodedOp {
            particle_type,
            name,
            value: &buf[value_start..value_start + value_len],
        });
        // the op's length-prefix does not include its own 4 bytes
        offset = value_start + value_len;
    }
    Ok((ops, offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_header_round_trips_size() {
        let mut buf = Buffer::new();
        buf.begin();
        buf.write_message_header(INFO1_READ, 0, 0, 0, 0);
        buf.end();
        let header = FrameHeader::decode(buf.as_slice()).unwrap();
        assert_eq!(header.version, CL_MSG_VERSION);
        assert_eq!(header.msg_type, AS_MSG_TYPE);
        assert_eq!(header.size as usize, buf.len() - 8);
    }

    #[test]
    fn rejects_oversized_frame() {
        let mut buf = [0u8; 8];
        buf[0] = CL_MSG_VERSION;
        BigEndian::write_u64(&mut buf, (MAX_BUFFER_SIZE as u64 + 1) | (2 << 56));
        // restore version byte clobbered by the write above
        buf[0] = CL_MSG_VERSION;
        assert!(FrameHeader::decode(&buf).is_err());
    }

    #[test]
    fn message_header_decodes_batch_index_slot() {
        let mut raw = [0u8; MSG_REMAINING_HEADER_SIZE];
        raw[3] = INFO3_LAST;
        BigEndian::write_u32(&mut raw[14..18], 7);
        let header = MessageHeader::decode(&raw).unwrap();
        assert!(header.is_last());
        assert_eq!(header.transaction_ttl, 7);
    }

    #[test]
    fn field_iter_round_trips_two_fields() {
        let mut buf = Buffer::new();
        buf.write_field_string("test", 0);
        buf.write_field_string("myset", 1);
        let (fields, consumed) = decode_field_iter(buf.as_slice(), 2).unwrap();
        assert_eq!(consumed, buf.len());
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].field_type, 0);
        assert_eq!(fields[0].payload, b"test");
        assert_eq!(fields[1].field_type, 1);
        assert_eq!(fields[1].payload, b"myset");
    }

    #[test]
    fn op_iter_round_trips_name_and_value() {
        let mut buf = Buffer::new();
        buf.write_operation_for_bin_name("bin1");
        let (ops, consumed) = decode_op_iter(buf.as_slice(), 1).unwrap();
        assert_eq!(consumed, buf.len());
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].name, "bin1");
        assert_eq!(ops[0].value.len(), 0);
    }

    #[test]
    fn field_iter_rejects_truncated_payload() {
        let buf = [0, 0, 0, 5, 0, b'a', b'b']; // claims 4-byte payload, only 2 present
        assert!(decode_field_iter(&buf, 1).is_err());
    }
}
