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

use crate::queue::consumer::ConsumerGroup;
use crate::queue::partition::Partition;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A named, partitioned append-only message stream. Name and partition count
/// are fixed at creation.
#[derive(Debug)]
pub struct Topic {
    pub name: String,
    pub created_at: DateTime<Utc>,
    partitions: Vec<Partition>,

    /// Consumer group states indexed by group name; groups register lazily on
    /// their first consume call.
    groups: DashMap<String, Arc<ConsumerGroup>>,

    /// Next partition for round-robin assignment of keyless appends.
    next_partition: AtomicUsize,
}

impl Topic {
    pub fn new(name: String, partition_count: usize) -> Self {
        let partitions = (0..partition_count).map(Partition::new).collect();
        Self {
            name,
            created_at: Utc::now(),
            partitions,
            groups: DashMap::new(),
            next_partition: AtomicUsize::new(0),
        }
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    pub fn partition(&self, index: usize) -> Option<&Partition> {
        self.partitions.get(index)
    }

    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    /// Round-robin pick for appends without a partition key.
    pub fn next_round_robin_partition(&self) -> usize {
        self.next_partition.fetch_add(1, Ordering::Relaxed) % self.partitions.len()
    }

    /// Get or lazily register the consumer group with this topic's partition
    /// layout. First caller wins the registration; everyone gets the same Arc.
    pub fn consumer_group(&self, group: &str) -> Arc<ConsumerGroup> {
        if let Some(existing) = self.groups.get(group) {
            return Arc::clone(&existing);
        }
        Arc::clone(
            &self
                .groups
                .entry(group.to_string())
                .or_insert_with(|| {
                    Arc::new(ConsumerGroup::new(group.to_string(), self.partitions.len()))
                }),
        )
    }

    /// Iterate registered consumer groups (for the lease sweeper).
    pub fn consumer_groups(&self) -> Vec<Arc<ConsumerGroup>> {
        self.groups.iter().map(|g| Arc::clone(&g)).collect()
    }
}
