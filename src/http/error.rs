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
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Boundary translation of `QueueError` into HTTP responses.
///
/// `NoMessageAvailable` maps to 204 No Content so an empty queue is
/// structurally distinguishable from every error status.
#[derive(Debug)]
pub struct ApiError(pub QueueError);

impl From<QueueError> for ApiError {
    fn from(error: QueueError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            QueueError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            QueueError::TopicNotFound(_)
            | QueueError::MessageNotFound(_)
            | QueueError::PartitionNotFound { .. } => StatusCode::NOT_FOUND,
            QueueError::InvalidState(_) => StatusCode::CONFLICT,
            QueueError::NoMessageAvailable => return StatusCode::NO_CONTENT.into_response(),
            QueueError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        let body = Json(json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}
