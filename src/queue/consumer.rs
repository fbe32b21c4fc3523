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

use std::sync::Mutex;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Exclusive claim on one message for one consumer group, pending resolution.
#[derive(Debug, Clone)]
pub struct Lease {
    pub message_id: Uuid,
    pub acquired_at: Instant,
}

impl Lease {
    pub fn new(message_id: Uuid) -> Self {
        Self {
            message_id,
            acquired_at: Instant::now(),
        }
    }

    pub fn is_expired(&self, visibility_timeout: Duration) -> bool {
        self.acquired_at.elapsed() >= visibility_timeout
    }
}

/// Delivery position of one consumer group on one partition.
///
/// `offset` is the next undelivered position; it only moves forward, and only
/// past resolved (acknowledged or dead-lettered) entries. `lease` holds the
/// group's single in-flight message on this partition, if any.
#[derive(Debug, Default)]
pub struct PartitionCursor {
    pub offset: u64,
    pub lease: Option<Lease>,
}

/// Per-topic state of one consumer group: one independently locked cursor per
/// partition. The mutex is the exclusive-access region for lease acquisition
/// on that (group, partition) pair; unrelated partitions and groups never
/// serialize on each other.
#[derive(Debug)]
pub struct ConsumerGroup {
    pub name: String,
    cursors: Vec<Mutex<PartitionCursor>>,
}

impl ConsumerGroup {
    pub fn new(name: String, partition_count: usize) -> Self {
        let cursors = (0..partition_count)
            .map(|_| Mutex::new(PartitionCursor::default()))
            .collect();
        Self { name, cursors }
    }

    pub fn cursor(&self, partition: usize) -> &Mutex<PartitionCursor> {
        &self.cursors[partition]
    }

    pub fn partition_count(&self) -> usize {
        self.cursors.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lease_expiry_respects_visibility_timeout() {
        let lease = Lease::new(Uuid::now_v7());
        assert!(!lease.is_expired(Duration::from_secs(30)));
        assert!(lease.is_expired(Duration::ZERO));
    }

    #[test]
    fn older_lease_is_expired_first() {
        let mut lease = Lease::new(Uuid::now_v7());
        lease.acquired_at = Instant::now() - Duration::from_secs(60);
        assert!(lease.is_expired(Duration::from_secs(30)));
        assert!(!Lease::new(lease.message_id).is_expired(Duration::from_secs(30)));
    }

    #[test]
    fn group_has_one_cursor_per_partition() {
        let group = ConsumerGroup::new("email-service".into(), 3);
        assert_eq!(group.partition_count(), 3);
        for partition in 0..3 {
            let cursor = group.cursor(partition).lock().unwrap();
            assert_eq!(cursor.offset, 0);
            assert!(cursor.lease.is_none());
        }
    }
}
