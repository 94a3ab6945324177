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

//! Error and Result types for the cluster, pool and batch core.

use std::io;
use std::net;
use std::num;
use std::str;
use std::string;

use crate::result_code::ResultCode;

/// Result type returned by all fallible operations in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type returned by this crate.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The client received a server response that it was not able to process.
    #[error("Bad Server Response: {0}")]
    BadResponse(String),

    /// The client was not able to communicate with the cluster due to some
    /// issue with the network connection.
    #[error("Unable to communicate with server cluster: {0}")]
    Connection(String),

    /// One or more of the arguments passed to the client are invalid.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No node in the cluster currently matches the requested name or
    /// partition ownership.
    #[error("Invalid node: {0}")]
    InvalidNode(String),

    /// A node's connection pool has no idle connections and is already at
    /// its configured capacity.
    #[error("No more connections available to node {0}")]
    NoMoreConnections(String),

    /// Server responded with a response code indicating an error condition.
    #[error("Server error: {0}")]
    ServerError(ResultCode),

    /// An operation did not complete before its deadline.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Error during an I/O operation.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error interpreting a sequence of bytes as a UTF-8 encoded string.
    #[error("Invalid UTF-8: {0}")]
    InvalidUtf8(#[from] str::Utf8Error),

    /// Error interpreting a `Vec<u8>` as a UTF-8 encoded `String`.
    #[error("Invalid UTF-8: {0}")]
    InvalidUtf8String(#[from] string::FromUtf8Error),

    /// Error parsing an integer out of an info-protocol response.
    #[error("Invalid integer: {0}")]
    ParseInt(#[from] num::ParseIntError),

    /// Error parsing an IP or socket address.
    #[error("Invalid address: {0}")]
    ParseAddr(#[from] net::AddrParseError),

    /// Error decoding a base64-encoded partition bitmap.
    #[error("Invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// A batch was submitted against a cluster with no active nodes.
    #[error("Cluster is empty")]
    ClusterEmpty,

    /// Routing a key to a node failed (no partition map entry and no active
    /// node to fall back to).
    #[error("No node available for key: {0}")]
    NoNodeForKey(String),

    /// The legacy direct batch protocol was selected but the keys span more
    /// than one namespace.
    #[error("A batch request with the direct protocol can only contain keys from a single namespace")]
    MultipleNamespaces,

    /// A batch response message's digest did not match the digest expected
    /// at its stated offset.
    #[error("Unexpected key in batch response at offset {0}")]
    UnexpectedKey(usize),

    /// A frame header declared a protocol version other than the one this
    /// client speaks.
    #[error("Unsupported protocol version: {0}")]
    ProtocolVersion(u8),

    /// A frame header declared a message type this client does not know
    /// how to parse.
    #[error("Unsupported protocol message type: {0}")]
    ProtocolType(u8),

    /// A read returned fewer bytes than a length-prefixed header or body
    /// declared.
    #[error("Truncated response: {0}")]
    Truncated(String),

    /// A compressed frame's body could not be inflated.
    #[error("Decompression failed: {0}")]
    Decompress(String),

    /// The client gave up on an in-flight operation for a reason other
    /// than a timeout or I/O failure (e.g. the cluster was destroyed
    /// while a batch was in flight).
    #[error("Client aborted: {0}")]
    ClientAbort(String),

    /// The requested operation is not supported, either by this client or
    /// by the node it was routed to.
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl Error {
    /// Builds a [`Error::Connection`] with the given detail message.
    pub fn connection<S: Into<String>>(details: S) -> Self {
        Error::Connection(details.into())
    }

    /// Builds a [`Error::BadResponse`] with the given detail message.
    pub fn bad_response<S: Into<String>>(details: S) -> Self {
        Error::BadResponse(details.into())
    }

    /// Builds a [`Error::InvalidNode`] with the given detail message.
    pub fn invalid_node<S: Into<String>>(details: S) -> Self {
        Error::InvalidNode(details.into())
    }

    /// Builds a [`Error::Timeout`] with the given detail message.
    pub fn timeout<S: Into<String>>(details: S) -> Self {
        Error::Timeout(details.into())
    }

    /// Builds a [`Error::Truncated`] with the given detail message.
    pub fn truncated<S: Into<String>>(details: S) -> Self {
        Error::Truncated(details.into())
    }
}
