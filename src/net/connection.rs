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

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::ops::Add;
use std::time::{Duration, Instant};

use crate::errors::{Error, Result};

/// A single TCP socket to a node, with connect/read/write deadlines and idle
/// tracking managed the way the rest of this core's blocking I/O is: no
/// async runtime, just `std::net` with explicit timeouts.
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
    idle_timeout: Option<Duration>,
    idle_deadline: Option<Instant>,
    bytes_read: usize,
}

impl Connection {
    /// Opens a new connection to `addr`, failing with [`Error::Timeout`] if
    /// the TCP handshake does not complete within `connect_timeout`.
    pub fn new(
        addr: SocketAddr,
        connect_timeout: Duration,
        idle_timeout: Option<Duration>,
    ) -> Result<Self> {
        let stream = TcpStream::connect_timeout(&addr, connect_timeout)
            .map_err(|e| Error::connection(format!("{}: {}", addr, e)))?;
        stream.set_nodelay(true).ok();
        let mut conn = Connection {
            stream,
            idle_timeout,
            idle_deadline: None,
            bytes_read: 0,
        };
        conn.refresh();
        Ok(conn)
    }

    /// Sets the read/write deadline used for every subsequent `write_all`/
    /// `read_exact` call on this connection.
    pub fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.stream.set_read_timeout(timeout).map_err(Error::from)?;
        self.stream
            .set_write_timeout(timeout)
            .map_err(Error::from)?;
        Ok(())
    }

    pub fn write(&mut self, buf: &[u8]) -> Result<()> {
        self.stream.write_all(buf).map_err(Error::from)?;
        self.refresh();
        Ok(())
    }

    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.stream.read_exact(buf).map_err(Error::from)?;
        self.bytes_read += buf.len();
        self.refresh();
        Ok(())
    }

    /// `true` once the idle deadline set by the last use of this connection
    /// has elapsed. A node's connection pool discards idle connections
    /// rather than handing out stale sockets.
    pub fn is_idle(&self) -> bool {
        self.idle_deadline
            .map_or(false, |deadline| Instant::now() >= deadline)
    }

    /// Extends the idle deadline; called after every successful I/O
    /// operation.
    fn refresh(&mut self) {
        self.idle_deadline = self.idle_timeout.map(|d| Instant::now().add(d));
    }

    pub fn close(self) {
        let _ = self.stream.shutdown(std::net::Shutdown::Both);
    }

    pub fn bookmark(&mut self) {
        self.bytes_read = 0;
    }

    pub fn bytes_read(&self) -> usize {
        self.bytes_read
    }

    /// A best-effort non-blocking peek used by the connection pool to
    /// detect a socket that still has unread bytes left over from a
    /// previous session. A clean idle connection reports `WouldBlock`; any
    /// actual byte (or an orderly close) means the socket is not safe to
    /// reuse.
    pub(crate) fn peek_is_empty(&self) -> std::io::Result<bool> {
        self.stream.set_nonblocking(true)?;
        let mut buf = [0u8; 1];
        let result = match self.stream.peek(&mut buf) {
            Ok(0) => Ok(false),
            Ok(_) => Ok(false),
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(true),
            Err(e) => Err(e),
        };
        self.stream.set_nonblocking(false)?;
        result
    }
}
