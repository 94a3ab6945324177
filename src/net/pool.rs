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

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crossbeam_queue::ArrayQueue;

use crate::errors::{Error, Result};
use crate::net::Connection;

/// A bounded FIFO of idle connections to one node. Connections are opened
/// lazily and closed either on failure or when the pool is already at
/// capacity; this struct owns none of the per-node reference counting
/// (that lives on `Node` itself), only the idle socket cache.
#[derive(Debug)]
pub struct ConnectionPool {
    idle: ArrayQueue<Connection>,
    capacity: usize,
    open_count: AtomicUsize,
}

impl ConnectionPool {
    pub fn new(capacity: usize) -> Self {
        ConnectionPool {
            idle: ArrayQueue::new(capacity.max(1)),
            capacity,
            open_count: AtomicUsize::new(0),
        }
    }

    /// Pops an idle connection, discarding any that turn out to be idle-
    /// timed-out or to have data sitting in their socket buffer (a
    /// leftover from a previous, improperly drained session). Opens a new
    /// connection if the pool is empty and under capacity.
    pub fn acquire(
        &self,
        addr: SocketAddr,
        connect_timeout: Duration,
        idle_timeout: Option<Duration>,
        deadline: Option<Instant>,
    ) -> Result<Connection> {
        while let Some(conn) = self.idle.pop() {
            if conn.is_idle() || !Self::is_clean(&conn) {
                self.open_count.fetch_sub(1, Ordering::Relaxed);
                conn.close();
                continue;
            }
            return Ok(conn);
        }

        let remaining = deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
            .unwrap_or(connect_timeout)
            .min(connect_timeout);
        if remaining.is_zero() {
            return Err(Error::timeout(format!("connect deadline exceeded for {}", addr)));
        }

        self.open_count.fetch_add(1, Ordering::Relaxed);
        match Connection::new(addr, remaining, idle_timeout) {
            Ok(conn) => Ok(conn),
            Err(e) => {
                self.open_count.fetch_sub(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    /// Returns a connection to the idle pool, closing it instead if the
    /// pool is already full.
    pub fn release(&self, conn: Connection) {
        if self.idle.len() >= self.capacity {
            self.open_count.fetch_sub(1, Ordering::Relaxed);
            conn.close();
            return;
        }
        if self.idle.push(conn).is_err() {
            self.open_count.fetch_sub(1, Ordering::Relaxed);
        }
    }

    /// Called when a borrowed connection failed and must not be returned to
    /// the pool.
    pub fn discard(&self, conn: Connection) {
        self.open_count.fetch_sub(1, Ordering::Relaxed);
        conn.close();
    }

    /// Closes every idle connection. Used when the owning node is
    /// deactivated and its last reference is released.
    pub fn close_all(&self) {
        while let Some(conn) = self.idle.pop() {
            conn.close();
        }
    }

    fn is_clean(conn: &Connection) -> bool {
        conn.peek_is_empty().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_starts_empty() {
        let pool = ConnectionPool::new(4);
        assert_eq!(pool.idle.len(), 0);
    }
}
