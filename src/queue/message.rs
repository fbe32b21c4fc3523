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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::Display;
use uuid::Uuid;

/// Lifecycle state of a message.
///
/// `pending` -> `leased` -> { `acknowledged` | `failed_retryable` -> `leased` | `dead_lettered` }.
/// `acknowledged` and `dead_lettered` are terminal.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageState {
    Pending,
    Leased,
    Acknowledged,
    FailedRetryable,
    DeadLettered,
}

impl MessageState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MessageState::Acknowledged | MessageState::DeadLettered)
    }

    /// Whether the message can be handed out to a consumer group.
    pub fn is_deliverable(&self) -> bool {
        matches!(self, MessageState::Pending | MessageState::FailedRetryable)
    }
}

/// A single slot in a partition log. The payload is opaque to the core and
/// immutable after append; only `state` and `attempts` change afterwards.
#[derive(Debug, Clone)]
pub struct MessageEntry {
    pub id: Uuid,
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
    pub state: MessageState,
    pub attempts: u32,
}

impl MessageEntry {
    pub fn new(payload: Value) -> Self {
        Self {
            id: Uuid::now_v7(),
            payload,
            timestamp: Utc::now(),
            state: MessageState::Pending,
            attempts: 0,
        }
    }
}

/// Location of a message within the system, kept in the engine's id index
/// so acknowledgments route straight to the owning partition slot.
#[derive(Debug, Clone)]
pub struct MessageLocation {
    pub topic: String,
    pub partition: usize,
    pub offset: u64,
}

/// Full message envelope returned to consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEnvelope {
    pub id: Uuid,
    pub topic: String,
    pub partition: usize,
    pub offset: u64,
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
}
