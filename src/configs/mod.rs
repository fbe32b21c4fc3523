/* Licensed to the Apache Software Foundation (ASF) under one
 * or more contributor license agreements.  See the NOTICE file
 * distributed with this work for additional information
 * regarding copyright ownership.  The ASF licenses this file
 * to you under the Apache License, Version 2.0 (the
 * "License"); you may not use this file except in compliance
 * with the License.  You may obtain a copy of the License at
 *
 *   http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing,
 * software distributed under the License is distributed on an
 * "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
 * KIND, either express or implied.  See the License for the
 * specific language governing permissions and limitations
 * under the License.
 */

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Environment prefix for config overrides, e.g. `OXQUEUE_HTTP.ADDRESS`.
const ENV_PREFIX: &str = "OXQUEUE_";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub http: HttpConfig,
    pub delivery: DeliveryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub address: String,
    pub cors_enabled: bool,
}

/// Delivery policy constants. The observed client contract never pins these,
/// so they are explicit configuration with documented defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Failures beyond this count dead-letter the message.
    pub max_retries: u32,
    /// An unresolved lease older than this becomes re-deliverable.
    pub visibility_timeout_secs: u64,
    /// How often the lease sweeper scans for expired leases.
    pub sweep_interval_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:3010".to_string(),
            cors_enabled: true,
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            visibility_timeout_secs: 30,
            sweep_interval_secs: 10,
        }
    }
}

impl ServerConfig {
    /// Layered load: built-in defaults, then the TOML file (if present), then
    /// `OXQUEUE_`-prefixed environment variables.
    pub fn load(path: &str) -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(ServerConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("."))
            .extract()
    }
}
