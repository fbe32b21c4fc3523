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

//! Single-node, in-memory partitioned message queue.
//!
//! Topics are partitioned append-only logs. Consumer groups pull one message
//! at a time per partition under a lease, acknowledge or fail it, and the
//! dashboard counters are derived from the authoritative message states on
//! every query.

pub mod configs;
pub mod error;
pub mod http;
pub mod queue;

pub use error::{QueueError, QueueResult};
pub use queue::{DashboardMetrics, MessageEnvelope, MessageState, QueueEngine};
