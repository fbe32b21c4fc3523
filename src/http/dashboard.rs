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

use crate::http::error::ApiError;
use crate::http::shared::AppState;
use crate::queue::DashboardMetrics;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router, debug_handler};
use std::sync::Arc;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/dashboard", get(get_dashboard))
        .with_state(state)
}

/// Counters are recomputed from the authoritative message states on every
/// call; the dashboard never accumulates state of its own.
#[debug_handler]
async fn get_dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardMetrics>, ApiError> {
    Ok(Json(state.engine.dashboard_metrics()))
}
