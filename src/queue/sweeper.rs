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

use crate::queue::engine::QueueEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, trace};

/// Periodic recovery path for abandoned leases: a lease that outlives the
/// visibility timeout is released so the message becomes deliverable again,
/// to any group. There is no explicit cancel call; this is the only way an
/// unresolved lease ever clears.
pub fn spawn_lease_sweeper(engine: Arc<QueueEngine>, interval: Duration) -> JoinHandle<()> {
    info!(
        "Starting lease sweeper, interval: {:?}, visibility timeout: {:?}",
        interval,
        engine.visibility_timeout()
    );
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let reclaimed = engine.reclaim_expired_leases();
            trace!("Lease sweep finished, reclaimed: {reclaimed}");
        }
    })
}
