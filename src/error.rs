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

use thiserror::Error;
use uuid::Uuid;

/// Error taxonomy for queue operations.
///
/// `NoMessageAvailable` is an expected empty-result condition, not a failure;
/// callers must be able to tell it apart from the genuine error kinds.
#[derive(Error, Debug)]
pub enum QueueError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("topic not found: {0}")]
    TopicNotFound(String),

    #[error("message not found: {0}")]
    MessageNotFound(Uuid),

    #[error("partition not found: {topic}/{partition}")]
    PartitionNotFound { topic: String, partition: usize },

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("no message available")]
    NoMessageAvailable,

    #[error("unavailable: {0}")]
    Unavailable(String),
}

pub type QueueResult<T> = Result<T, QueueError>;
