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

use clap::Parser;
use dotenvy::dotenv;
use figlet_rs::FIGfont;
use oxqueue::configs::ServerConfig;
use oxqueue::error::QueueError;
use oxqueue::http;
use oxqueue::queue::QueueEngine;
use oxqueue::queue::sweeper::spawn_lease_sweeper;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "oxqueue", about = "Partitioned message queue server")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "config/server.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), QueueError> {
    if let Ok(path) = dotenv() {
        eprintln!("Loaded environment variables from: {}", path.display());
    }

    if let Ok(font) = FIGfont::standard() {
        if let Some(figure) = font.convert("oxqueue") {
            eprintln!("{figure}");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or(EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = ServerConfig::load(&args.config)
        .map_err(|error| QueueError::InvalidArgument(format!("invalid configuration: {error}")))?;
    info!(
        "Loaded configuration from: {}, max retries: {}, visibility timeout: {}s",
        args.config, config.delivery.max_retries, config.delivery.visibility_timeout_secs
    );

    let engine = Arc::new(QueueEngine::new(&config.delivery));
    spawn_lease_sweeper(
        Arc::clone(&engine),
        Duration::from_secs(config.delivery.sweep_interval_secs),
    );

    http::serve(engine, &config.http).await
}
