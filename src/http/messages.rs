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

use crate::error::QueueError;
use crate::http::error::ApiError;
use crate::http::shared::AppState;
use crate::queue::{MessageEnvelope, MessageState};
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router, debug_handler};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/produce", post(produce))
        .route("/consume", get(consume))
        .route("/ack", post(acknowledge))
        .with_state(state)
}

/// All fields are optional at the serde level so that missing required
/// fields surface as a 400 from explicit validation rather than an extractor
/// rejection.
#[derive(Debug, Deserialize)]
pub struct ProduceRequest {
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub payload: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct ProduceResponse {
    pub id: Uuid,
    pub topic: String,
    pub partition: usize,
    pub offset: u64,
    pub status: MessageState,
}

#[derive(Debug, Deserialize)]
pub struct ConsumeParams {
    pub topic: String,
    pub group: String,
    #[serde(default)]
    pub batch: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct AckRequest {
    pub message_id: Uuid,
    pub status: String,
    /// Consumer group holding the lease. May be omitted, in which case the
    /// current lease holder is resolved from the engine (the observed client
    /// never sends one).
    #[serde(default)]
    pub group: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub message_id: Uuid,
    pub state: MessageState,
}

#[debug_handler]
async fn produce(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ProduceRequest>,
) -> Result<Json<ProduceResponse>, ApiError> {
    let topic = match request.topic {
        Some(topic) if !topic.trim().is_empty() => topic,
        _ => return Err(QueueError::InvalidArgument("topic must not be empty".into()).into()),
    };
    let Some(payload) = request.payload else {
        return Err(QueueError::InvalidArgument("payload is required".into()).into());
    };
    let (id, partition, offset) = state
        .engine
        .append(&topic, request.key.as_deref(), payload)?;
    Ok(Json(ProduceResponse {
        id,
        topic,
        partition,
        offset,
        status: MessageState::Pending,
    }))
}

/// One message per partition per group is in flight at a time; `batch` asks
/// for up to that many messages in one call (default 1). An empty queue is a
/// 204, not an error.
#[debug_handler]
async fn consume(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ConsumeParams>,
) -> Result<Json<Vec<MessageEnvelope>>, ApiError> {
    if params.topic.trim().is_empty() || params.group.trim().is_empty() {
        return Err(QueueError::InvalidArgument("missing topic or group".into()).into());
    }
    let batch = params.batch.unwrap_or(1).max(1);
    let messages = state.engine.lease_many(&params.topic, &params.group, batch)?;
    if messages.is_empty() {
        return Err(QueueError::NoMessageAvailable.into());
    }
    Ok(Json(messages))
}

#[debug_handler]
async fn acknowledge(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AckRequest>,
) -> Result<Json<AckResponse>, ApiError> {
    // Validate the status before touching any state.
    let acknowledged = match request.status.as_str() {
        "acknowledged" => true,
        "failed" => false,
        other => {
            return Err(
                QueueError::InvalidArgument(format!("invalid status value: {other}")).into(),
            );
        }
    };
    let group = match request.group {
        Some(group) => group,
        None => state.engine.lease_holder(request.message_id)?,
    };
    let state_after = if acknowledged {
        state.engine.acknowledge(request.message_id, &group)?;
        MessageState::Acknowledged
    } else {
        state.engine.fail(request.message_id, &group)?
    };
    Ok(Json(AckResponse {
        message_id: request.message_id,
        state: state_after,
    }))
}
