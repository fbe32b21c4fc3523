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

use crate::queue::message::MessageState;
use serde::{Deserialize, Serialize};

/// Dashboard counters derived from the authoritative message states.
///
/// Leased-but-unresolved messages get their own `in_flight_messages` bucket,
/// which keeps the conservation equality exact:
/// `total == pending + in_flight + acknowledged + failed_retryable + dead_lettered`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardMetrics {
    pub total_messages: u64,
    pub pending_messages: u64,
    pub in_flight_messages: u64,
    pub acknowledged_messages: u64,
    pub retryable_failed_messages: u64,
    pub dead_letter_messages: u64,
}

impl DashboardMetrics {
    pub fn count(&mut self, state: MessageState) {
        self.total_messages += 1;
        match state {
            MessageState::Pending => self.pending_messages += 1,
            MessageState::Leased => self.in_flight_messages += 1,
            MessageState::Acknowledged => self.acknowledged_messages += 1,
            MessageState::FailedRetryable => self.retryable_failed_messages += 1,
            MessageState::DeadLettered => self.dead_letter_messages += 1,
        }
    }

    pub fn is_conserved(&self) -> bool {
        self.total_messages
            == self.pending_messages
                + self.in_flight_messages
                + self.acknowledged_messages
                + self.retryable_failed_messages
                + self.dead_letter_messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_state_lands_in_exactly_one_bucket() {
        let mut metrics = DashboardMetrics::default();
        metrics.count(MessageState::Pending);
        metrics.count(MessageState::Leased);
        metrics.count(MessageState::Acknowledged);
        metrics.count(MessageState::FailedRetryable);
        metrics.count(MessageState::FailedRetryable);
        metrics.count(MessageState::DeadLettered);

        assert_eq!(metrics.total_messages, 6);
        assert_eq!(metrics.pending_messages, 1);
        assert_eq!(metrics.in_flight_messages, 1);
        assert_eq!(metrics.acknowledged_messages, 1);
        assert_eq!(metrics.retryable_failed_messages, 2);
        assert_eq!(metrics.dead_letter_messages, 1);
        assert!(metrics.is_conserved());
    }

    #[test]
    fn serializes_with_dashboard_field_names() {
        let metrics = DashboardMetrics::default();
        let json = serde_json::to_value(metrics).unwrap();
        assert!(json.get("total_messages").is_some());
        assert!(json.get("pending_messages").is_some());
        assert!(json.get("in_flight_messages").is_some());
        assert!(json.get("acknowledged_messages").is_some());
        assert!(json.get("retryable_failed_messages").is_some());
        assert!(json.get("dead_letter_messages").is_some());
    }
}
