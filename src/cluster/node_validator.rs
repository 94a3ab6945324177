// Copyright 2015-2018 Aerospike, Inc.
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

use std::time::Duration;

use crate::errors::{Error, Result};
use crate::host::Host;
use crate::net::{info, Connection};
use crate::policy::ClientPolicy;

/// Resolves a seed or friend host to every address it answers on and
/// extracts the identity/feature facts a brand new [`Node`](super::node::Node)
/// is built from.
#[derive(Clone, Debug)]
pub struct NodeValidator {
    pub name: String,
    pub aliases: Vec<Host>,
    pub supports_float: bool,
    pub supports_batch_index: bool,
    pub supports_replicas_all: bool,
    pub supports_geo: bool,
}

impl NodeValidator {
    /// Resolves `host`, then tries each resolved address until one answers
    /// the identity/feature info request.
    pub fn validate(client_policy: &ClientPolicy, host: &Host) -> Result<Self> {
        let aliases = host.resolve()?;
        let connect_timeout = client_policy.timeout.unwrap_or(Duration::from_secs(1));

        let mut last_err = None;
        for addr in &aliases {
            match Self::validate_alias(client_policy, *addr, connect_timeout) {
                Ok(mut nv) => {
                    nv.aliases = aliases
                        .iter()
                        .map(|a| Host::new(&a.ip().to_string(), a.port()))
                        .collect();
                    return Ok(nv);
                }
                Err(e) => last_err = Some(e),
            }
        }

        Err(last_err.unwrap_or_else(|| Error::connection(format!("failed to resolve {}", host))))
    }

    fn validate_alias(
        client_policy: &ClientPolicy,
        addr: std::net::SocketAddr,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let mut conn = Connection::new(addr, connect_timeout, client_policy.idle_timeout)?;
        let info_map = info(&mut conn, &["node", "features"])?;
        conn.close();

        let name = info_map
            .get("node")
            .cloned()
            .ok_or_else(|| Error::invalid_node("missing node name"))?;

        let mut nv = NodeValidator {
            name,
            aliases: vec![],
            supports_float: false,
            supports_batch_index: false,
            supports_replicas_all: false,
            supports_geo: false,
        };
        if let Some(features) = info_map.get("features") {
            nv.set_features(features);
        }
        Ok(nv)
    }

    fn set_features(&mut self, features: &str) {
        for feature in features.split(';') {
            match feature {
                "float" => self.supports_float = true,
                "batch-index" => self.supports_batch_index = true,
                "replicas-all" => self.supports_replicas_all = true,
                "geo" => self.supports_geo = true,
                _ => (),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_features_parses_known_flags() {
        let mut nv = NodeValidator {
            name: "n".to_string(),
            aliases: vec![],
            supports_float: false,
            supports_batch_index: false,
            supports_replicas_all: false,
            supports_geo: false,
        };
        nv.set_features("float;batch-index;geo;some-unknown-flag");
        assert!(nv.supports_float);
        assert!(nv.supports_batch_index);
        assert!(nv.supports_geo);
        assert!(!nv.supports_replicas_all);
    }
}
