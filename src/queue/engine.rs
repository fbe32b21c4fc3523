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

use crate::configs::DeliveryConfig;
use crate::error::{QueueError, QueueResult};
use crate::queue::consumer::Lease;
use crate::queue::message::{MessageEnvelope, MessageLocation, MessageState};
use crate::queue::metrics::DashboardMetrics;
use crate::queue::topic::Topic;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};
use twox_hash::XxHash32;
use uuid::Uuid;

const XXHASH_SEED: u32 = 0;

/// The queue core: topic registry, partitioned logs, delivery tracking and
/// acknowledgment processing behind one handle.
///
/// Message lifecycle state is authoritative and global per message; the
/// dashboard metrics are always derived from it, never stored separately.
#[derive(Debug)]
pub struct QueueEngine {
    topics: DashMap<String, Arc<Topic>>,

    /// Message id -> owning slot, for O(1) acknowledgment routing.
    locations: DashMap<Uuid, MessageLocation>,

    max_retries: u32,
    visibility_timeout: Duration,
}

impl QueueEngine {
    pub fn new(config: &DeliveryConfig) -> Self {
        Self {
            topics: DashMap::new(),
            locations: DashMap::new(),
            max_retries: config.max_retries,
            visibility_timeout: Duration::from_secs(config.visibility_timeout_secs),
        }
    }

    pub fn visibility_timeout(&self) -> Duration {
        self.visibility_timeout
    }

    // Topic registry

    /// Register a topic with `partition_count` empty partitions. Registration
    /// is atomic per name: the first writer wins and concurrent duplicate
    /// creates fail instead of silently succeeding twice.
    pub fn create_topic(&self, name: &str, partition_count: usize) -> QueueResult<Arc<Topic>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(QueueError::InvalidArgument(
                "topic name must not be empty".into(),
            ));
        }
        if partition_count < 1 {
            return Err(QueueError::InvalidArgument(format!(
                "partition count must be positive, got {partition_count}"
            )));
        }

        match self.topics.entry(name.to_string()) {
            Entry::Occupied(_) => Err(QueueError::InvalidArgument(format!(
                "topic already exists: {name}"
            ))),
            Entry::Vacant(vacant) => {
                let topic = Arc::new(Topic::new(name.to_string(), partition_count));
                vacant.insert(Arc::clone(&topic));
                info!("Created topic: {name} with {partition_count} partitions");
                Ok(topic)
            }
        }
    }

    /// Topics ordered by creation time, restartable per call.
    pub fn list_topics(&self) -> Vec<Arc<Topic>> {
        let mut topics: Vec<Arc<Topic>> =
            self.topics.iter().map(|t| Arc::clone(&t)).collect();
        topics.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.name.cmp(&b.name))
        });
        topics
    }

    pub fn get_topic(&self, name: &str) -> QueueResult<Arc<Topic>> {
        self.topics
            .get(name)
            .map(|t| Arc::clone(&t))
            .ok_or_else(|| QueueError::TopicNotFound(name.to_string()))
    }

    // Partitioned log

    /// Append a payload to the topic, picking the partition from the caller's
    /// key (xxhash32 modulo partition count, so a fixed key always lands on
    /// the same partition) or round-robin when no key is given.
    pub fn append(
        &self,
        topic_name: &str,
        key: Option<&str>,
        payload: Value,
    ) -> QueueResult<(Uuid, usize, u64)> {
        let topic = self.get_topic(topic_name)?;
        let partition_index = match key.filter(|k| !k.is_empty()) {
            Some(key) => {
                XxHash32::oneshot(XXHASH_SEED, key.as_bytes()) as usize % topic.partition_count()
            }
            None => topic.next_round_robin_partition(),
        };
        let partition = topic
            .partition(partition_index)
            .ok_or_else(|| QueueError::TopicNotFound(topic_name.to_string()))?;
        let (id, offset) = partition.append(payload);
        self.locations.insert(
            id,
            MessageLocation {
                topic: topic.name.clone(),
                partition: partition_index,
                offset,
            },
        );
        trace!("Appended message {id} to {topic_name}/{partition_index} at offset {offset}");
        Ok((id, partition_index, offset))
    }

    /// Read the message at a fixed position; `NoMessageAvailable` if that
    /// offset has not been produced yet.
    pub fn read(
        &self,
        topic_name: &str,
        partition: usize,
        offset: u64,
    ) -> QueueResult<MessageEnvelope> {
        let topic = self.get_topic(topic_name)?;
        let partition = topic
            .partition(partition)
            .ok_or_else(|| QueueError::PartitionNotFound {
                topic: topic_name.to_string(),
                partition,
            })?;
        partition
            .with_entry(offset, |entry| MessageEnvelope {
                id: entry.id,
                topic: topic.name.clone(),
                partition: partition.index,
                offset,
                payload: entry.payload.clone(),
                timestamp: entry.timestamp,
            })
            .ok_or(QueueError::NoMessageAvailable)
    }

    // Delivery tracker

    /// Hand out the next available message for `group`, scanning partitions
    /// in ascending index order. At most one message is in flight per
    /// (topic, group, partition); a partition whose current entry is leased
    /// to another group is skipped until that lease resolves or expires.
    pub fn lease(&self, topic_name: &str, group: &str) -> QueueResult<MessageEnvelope> {
        let topic = self.get_topic(topic_name)?;
        let group_state = topic.consumer_group(group);

        for partition in topic.partitions() {
            let mut cursor = group_state
                .cursor(partition.index)
                .lock()
                .expect("cursor lock poisoned");

            if let Some(lease) = cursor.lease.as_ref() {
                if !lease.is_expired(self.visibility_timeout) {
                    // Single in-flight per partition per group.
                    continue;
                }
                // Visibility timeout elapsed without resolution: re-offer the
                // same message to the same group and restart the window, but
                // only if this group still owns the entry.
                let message_id = lease.message_id;
                let offset = cursor.offset;
                let renewed = partition
                    .with_entry_mut(offset, |entry| {
                        if entry.id != message_id || entry.state != MessageState::Leased {
                            return None;
                        }
                        Some(MessageEnvelope {
                            id: entry.id,
                            topic: topic.name.clone(),
                            partition: partition.index,
                            offset,
                            payload: entry.payload.clone(),
                            timestamp: entry.timestamp,
                        })
                    })
                    .flatten();
                if let Some(envelope) = renewed {
                    cursor.lease = Some(Lease::new(message_id));
                    debug!(
                        "Re-offered expired lease on message {message_id} to group {group} \
                         on {topic_name}/{}",
                        partition.index
                    );
                    return Ok(envelope);
                }
                // Stale claim: the message moved on without us. Drop it and
                // rescan the partition from the cursor.
                cursor.lease = None;
            }

            loop {
                let Some((id, state)) =
                    partition.with_entry(cursor.offset, |entry| (entry.id, entry.state))
                else {
                    // Cursor caught up with the head of the partition.
                    break;
                };
                if state.is_terminal() {
                    // Resolved (possibly by another group); step past it.
                    cursor.offset += 1;
                    continue;
                }
                if !state.is_deliverable() {
                    // Leased to another group; partition is blocked for now.
                    break;
                }

                let offset = cursor.offset;
                // The read above ran under a lock that is gone by now;
                // another group's cursor on this partition may have claimed
                // the entry in between. The flip to leased re-validates under
                // the write lock so only one claimant can win.
                let Some(claimed) = partition.with_entry_mut(offset, |entry| {
                    if !entry.state.is_deliverable() {
                        return None;
                    }
                    entry.state = MessageState::Leased;
                    Some(MessageEnvelope {
                        id: entry.id,
                        topic: topic.name.clone(),
                        partition: partition.index,
                        offset,
                        payload: entry.payload.clone(),
                        timestamp: entry.timestamp,
                    })
                }) else {
                    break;
                };
                let Some(envelope) = claimed else {
                    // Lost the claim; look at the same offset again to see
                    // whether it is now blocked or already resolved.
                    continue;
                };
                cursor.lease = Some(Lease::new(id));
                trace!(
                    "Leased message {id} to group {group} on {topic_name}/{} at offset {offset}",
                    partition.index
                );
                return Ok(envelope);
            }
        }

        Err(QueueError::NoMessageAvailable)
    }

    /// Lease up to `max` messages in one call. The single-in-flight invariant
    /// still holds per partition, so the batch never exceeds the topic's
    /// partition count.
    pub fn lease_many(
        &self,
        topic_name: &str,
        group: &str,
        max: usize,
    ) -> QueueResult<Vec<MessageEnvelope>> {
        let mut messages = Vec::new();
        for _ in 0..max {
            match self.lease(topic_name, group) {
                Ok(envelope) => messages.push(envelope),
                Err(QueueError::NoMessageAvailable) => break,
                Err(error) => return Err(error),
            }
        }
        Ok(messages)
    }

    // Acknowledgment processor

    /// Resolve a leased message as successfully processed. The group's cursor
    /// advances past it and the lease is released. A second acknowledge on
    /// the same message fails with `InvalidState`.
    pub fn acknowledge(&self, message_id: Uuid, group: &str) -> QueueResult<()> {
        let (topic, location) = self.locate(message_id)?;
        let group_state = topic.consumer_group(group);
        let partition = topic
            .partition(location.partition)
            .ok_or(QueueError::MessageNotFound(message_id))?;

        let mut cursor = group_state
            .cursor(location.partition)
            .lock()
            .expect("cursor lock poisoned");
        self.ensure_leased_by(&cursor.lease, message_id, group)?;

        let resolved = partition
            .with_entry_mut(location.offset, |entry| {
                if entry.state == MessageState::Leased {
                    entry.state = MessageState::Acknowledged;
                    true
                } else {
                    false
                }
            })
            .ok_or(QueueError::MessageNotFound(message_id))?;
        if !resolved {
            return Err(QueueError::InvalidState(format!(
                "message {message_id} is already resolved"
            )));
        }

        cursor.offset = location.offset + 1;
        cursor.lease = None;
        debug!(
            "Acknowledged message {message_id} for group {group} on {}/{}",
            location.topic, location.partition
        );
        Ok(())
    }

    /// Resolve a leased message as failed. Within the retry budget the
    /// message returns to `failed_retryable` at the same cursor position and
    /// is redelivered on the next lease; past the budget it is dead-lettered
    /// and the cursor steps past it so the partition is not blocked forever.
    pub fn fail(&self, message_id: Uuid, group: &str) -> QueueResult<MessageState> {
        let (topic, location) = self.locate(message_id)?;
        let group_state = topic.consumer_group(group);
        let partition = topic
            .partition(location.partition)
            .ok_or(QueueError::MessageNotFound(message_id))?;

        let mut cursor = group_state
            .cursor(location.partition)
            .lock()
            .expect("cursor lock poisoned");
        self.ensure_leased_by(&cursor.lease, message_id, group)?;

        let max_retries = self.max_retries;
        let new_state = partition
            .with_entry_mut(location.offset, |entry| {
                if entry.state != MessageState::Leased {
                    return None;
                }
                entry.attempts += 1;
                entry.state = if entry.attempts > max_retries {
                    MessageState::DeadLettered
                } else {
                    MessageState::FailedRetryable
                };
                Some(entry.state)
            })
            .ok_or(QueueError::MessageNotFound(message_id))?;
        let Some(new_state) = new_state else {
            return Err(QueueError::InvalidState(format!(
                "message {message_id} is already resolved"
            )));
        };

        cursor.lease = None;
        match new_state {
            MessageState::DeadLettered => {
                cursor.offset = location.offset + 1;
                warn!(
                    "Dead-lettered message {message_id} on {}/{} after exceeding {} retries",
                    location.topic, location.partition, max_retries
                );
            }
            _ => {
                debug!(
                    "Marked message {message_id} retryable for group {group} on {}/{}",
                    location.topic, location.partition
                );
            }
        }
        Ok(new_state)
    }

    /// Release every lease older than the visibility timeout, reverting the
    /// message to a deliverable state so any group can claim it again.
    /// Returns the number of reclaimed leases.
    pub fn reclaim_expired_leases(&self) -> usize {
        let mut reclaimed = 0;
        for topic in self.topics.iter() {
            for group in topic.consumer_groups() {
                for partition in topic.partitions() {
                    let mut cursor = group
                        .cursor(partition.index)
                        .lock()
                        .expect("cursor lock poisoned");
                    let expired = cursor
                        .lease
                        .as_ref()
                        .is_some_and(|lease| lease.is_expired(self.visibility_timeout));
                    if !expired {
                        continue;
                    }
                    cursor.lease = None;
                    partition.with_entry_mut(cursor.offset, |entry| {
                        if entry.state == MessageState::Leased {
                            entry.state = if entry.attempts > 0 {
                                MessageState::FailedRetryable
                            } else {
                                MessageState::Pending
                            };
                        }
                    });
                    reclaimed += 1;
                }
            }
        }
        if reclaimed > 0 {
            info!("Reclaimed {reclaimed} expired leases");
        }
        reclaimed
    }

    // Metrics aggregator

    /// Derive the dashboard counters from the authoritative message states.
    /// Pure read path: holds no state of its own and is recomputed per call.
    pub fn dashboard_metrics(&self) -> DashboardMetrics {
        let mut metrics = DashboardMetrics::default();
        for topic in self.topics.iter() {
            for partition in topic.partitions() {
                metrics = partition.fold_entries(metrics, |mut acc, entry| {
                    acc.count(entry.state);
                    acc
                });
            }
        }
        metrics
    }

    /// Resolve which consumer group currently holds the lease on a message.
    /// `InvalidState` when nobody does. Used by the boundary when the caller
    /// does not identify itself on acknowledge.
    pub fn lease_holder(&self, message_id: Uuid) -> QueueResult<String> {
        let (topic, location) = self.locate(message_id)?;
        for group in topic.consumer_groups() {
            let cursor = group
                .cursor(location.partition)
                .lock()
                .expect("cursor lock poisoned");
            if cursor
                .lease
                .as_ref()
                .is_some_and(|lease| lease.message_id == message_id)
            {
                return Ok(group.name.clone());
            }
        }
        Err(QueueError::InvalidState(format!(
            "message {message_id} is not currently leased"
        )))
    }

    fn locate(&self, message_id: Uuid) -> QueueResult<(Arc<Topic>, MessageLocation)> {
        let location = self
            .locations
            .get(&message_id)
            .map(|l| l.clone())
            .ok_or(QueueError::MessageNotFound(message_id))?;
        let topic = self.get_topic(&location.topic)?;
        Ok((topic, location))
    }

    fn ensure_leased_by(
        &self,
        lease: &Option<Lease>,
        message_id: Uuid,
        group: &str,
    ) -> QueueResult<()> {
        match lease {
            Some(lease) if lease.message_id == message_id => Ok(()),
            _ => Err(QueueError::InvalidState(format!(
                "message {message_id} is not leased by group {group}"
            ))),
        }
    }
}
