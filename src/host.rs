// Copyright 2015-2016 Aerospike, Inc.
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

use core::cmp;
use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};

use crate::errors::{Error, Result};

// Host name/port of a database server, either a seed address configured by
// the application or a friend address learned via the info protocol.
#[derive(Debug, Eq, Hash, Clone)]
pub struct Host {
    // Host name or IP address of database server.
    pub name: String,

    // Port of database server.
    pub port: u16,
}

impl Host {
    // Initializes a new host instance.
    pub fn new(name: &str, port: u16) -> Self {
        Host {
            name: name.to_string(),
            port,
        }
    }

    // Parses a "name:port" pair as returned in a `services`/`services-alternate`
    // info response.
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = s.rsplitn(2, ':');
        let port = parts
            .next()
            .ok_or_else(|| Error::bad_response(format!("malformed host entry: {}", s)))?;
        let name = parts
            .next()
            .ok_or_else(|| Error::bad_response(format!("malformed host entry: {}", s)))?;
        let port: u16 = port
            .parse()
            .map_err(|_| Error::bad_response(format!("malformed host port: {}", s)))?;
        Ok(Host::new(name, port))
    }

    /// Resolves this host to every `sockaddr` it maps to, the way a
    /// multi-homed node is discovered during seed/alias resolution.
    pub fn resolve(&self) -> Result<Vec<SocketAddr>> {
        let addrs: Vec<SocketAddr> = (self.name.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| Error::connection(format!("{}: {}", self, e)))?
            .collect();
        if addrs.is_empty() {
            return Err(Error::connection(format!("no addresses found for {}", self)));
        }
        Ok(addrs)
    }
}

impl cmp::PartialEq for Host {
    fn eq(&self, other: &Host) -> bool {
        self.name == other.name && self.port == other.port
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::Host;

    #[test]
    fn parses_name_port() {
        let h = Host::parse("192.168.1.10:3000").unwrap();
        assert_eq!(h.name, "192.168.1.10");
        assert_eq!(h.port, 3000);
    }

    #[test]
    fn rejects_missing_port() {
        assert!(Host::parse("192.168.1.10").is_err());
    }

    #[test]
    fn equality_ignores_nothing() {
        assert_eq!(Host::new("a", 3000), Host::new("a", 3000));
        assert_ne!(Host::new("a", 3000), Host::new("a", 3001));
    }
}
