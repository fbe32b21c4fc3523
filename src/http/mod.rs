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

pub mod dashboard;
pub mod error;
pub mod messages;
pub mod shared;
pub mod topics;

use crate::configs::HttpConfig;
use crate::error::QueueError;
use crate::queue::QueueEngine;
use axum::Router;
use axum::routing::get;
use shared::AppState;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

const NAME: &str = "oxqueue API";
const PONG: &str = "pong";

pub fn build_router(engine: Arc<QueueEngine>, config: &HttpConfig) -> Router {
    let state = Arc::new(AppState { engine });
    let api = Router::new()
        .merge(topics::router(Arc::clone(&state)))
        .merge(messages::router(Arc::clone(&state)))
        .merge(dashboard::router(Arc::clone(&state)));

    let mut router = Router::new()
        .route("/", get(|| async { NAME }))
        .route("/ping", get(|| async { PONG }))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http());
    if config.cors_enabled {
        router = router.layer(CorsLayer::permissive());
    }
    router
}

pub async fn serve(engine: Arc<QueueEngine>, config: &HttpConfig) -> Result<(), QueueError> {
    let router = build_router(engine, config);
    let listener = tokio::net::TcpListener::bind(&config.address)
        .await
        .map_err(|error| {
            QueueError::Unavailable(format!("failed to bind {}: {error}", config.address))
        })?;
    let address = listener
        .local_addr()
        .map_err(|error| QueueError::Unavailable(error.to_string()))?;
    info!("Started HTTP API on: {address}");
    axum::serve(listener, router)
        .await
        .map_err(|error| QueueError::Unavailable(error.to_string()))
}
