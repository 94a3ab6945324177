// Copyright 2015-2017 Aerospike, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::HashMap;
use std::time::Duration;

const MIN_TEND_INTERVAL: Duration = Duration::from_millis(1000);

/// Encapsulates parameters that configure a `Cluster` handle.
#[derive(Debug, Clone)]
pub struct ClientPolicy {
    /// User authentication to cluster. Leave empty for clusters running
    /// without restricted access.
    pub user_password: Option<(String, String)>,

    /// Initial host connection timeout — the timeout when opening a
    /// connection to a server host for the first time. Default 1s.
    pub timeout: Option<Duration>,

    /// Connection idle timeout. Every time a connection is used, its idle
    /// deadline is extended by this duration; when the deadline is reached
    /// the connection is closed and discarded from the connection pool.
    /// Default 5s.
    pub idle_timeout: Option<Duration>,

    /// Size of the per-node connection pool. Default 256.
    pub connection_pool_size_per_node: usize,

    /// Fail fast during initial seeding if no node can be reached.
    pub fail_if_not_connected: bool,

    /// Interval for checking for cluster state changes. Clamped to a
    /// minimum of 1000ms.
    pub tend_interval: Duration,

    /// A translation table for cases where different clients use different
    /// server IP addresses, e.g. clients both inside and outside a local
    /// network. The key is the IP address returned from friend info
    /// requests; the value is the address this client should dial instead.
    pub ip_map: Option<HashMap<String, String>>,

    /// Use `services-alternate` instead of `services` in the info request
    /// issued during cluster tending. Useful as an alternative to `ip_map`
    /// when the server is configured with external addresses.
    pub use_services_alternate: bool,

    /// Size of the worker pool used to dispatch per-node batch tasks.
    pub thread_pool_size: usize,
}

impl Default for ClientPolicy {
    fn default() -> ClientPolicy {
        ClientPolicy {
            user_password: None,
            timeout: Some(Duration::from_secs(1)),
            idle_timeout: Some(Duration::from_secs(5)),
            connection_pool_size_per_node: 256,
            fail_if_not_connected: true,
            tend_interval: MIN_TEND_INTERVAL,
            ip_map: None,
            use_services_alternate: false,
            thread_pool_size: 16,
        }
    }
}

impl ClientPolicy {
    /// Returns the configured tend interval, clamped to the 1000ms floor.
    pub fn tend_interval(&self) -> Duration {
        if self.tend_interval < MIN_TEND_INTERVAL {
            MIN_TEND_INTERVAL
        } else {
            self.tend_interval
        }
    }

    /// Applies the configured ip map to an address reported by a friend
    /// node, substituting it if a translation is present.
    pub(crate) fn translate_address<'a>(&'a self, address: &'a str) -> &'a str {
        match &self.ip_map {
            Some(map) => map.get(address).map(String::as_str).unwrap_or(address),
            None => address,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_tend_interval_to_floor() {
        let mut policy = ClientPolicy::default();
        policy.tend_interval = Duration::from_millis(10);
        assert_eq!(policy.tend_interval(), MIN_TEND_INTERVAL);
    }

    #[test]
    fn translates_addresses_via_ip_map() {
        let mut policy = ClientPolicy::default();
        let mut map = HashMap::new();
        map.insert("10.0.0.1".to_string(), "203.0.113.5".to_string());
        policy.ip_map = Some(map);
        assert_eq!(policy.translate_address("10.0.0.1"), "203.0.113.5");
        assert_eq!(policy.translate_address("10.0.0.2"), "10.0.0.2");
    }
}
