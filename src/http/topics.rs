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
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router, debug_handler};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/topics", get(list_topics).post(create_topic))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct CreateTopicRequest {
    pub name: String,
    pub partitions: usize,
}

#[derive(Debug, Serialize)]
pub struct TopicResponse {
    pub name: String,
    pub partitions: Vec<usize>,
    pub created_at: DateTime<Utc>,
}

#[debug_handler]
async fn create_topic(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateTopicRequest>,
) -> Result<(StatusCode, Json<TopicResponse>), ApiError> {
    let topic = state.engine.create_topic(&request.name, request.partitions)?;
    let response = TopicResponse {
        name: topic.name.clone(),
        partitions: (0..topic.partition_count()).collect(),
        created_at: topic.created_at,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

#[debug_handler]
async fn list_topics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TopicResponse>>, ApiError> {
    let topics = state
        .engine
        .list_topics()
        .into_iter()
        .map(|topic| TopicResponse {
            name: topic.name.clone(),
            partitions: (0..topic.partition_count()).collect(),
            created_at: topic.created_at,
        })
        .collect();
    Ok(Json(topics))
}
