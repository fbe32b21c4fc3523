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

use crate::queue::message::MessageEntry;
use serde_json::Value;
use std::sync::RwLock;
use uuid::Uuid;

/// One ordered sub-stream of a topic: an append-only vector of entries where
/// the vector index is the message offset. Appends to the same partition are
/// serialized by the write lock; different partitions never contend.
#[derive(Debug)]
pub struct Partition {
    pub index: usize,
    log: RwLock<Vec<MessageEntry>>,
}

impl Partition {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            log: RwLock::new(Vec::new()),
        }
    }

    /// Append a payload and return (message id, assigned offset).
    pub fn append(&self, payload: Value) -> (Uuid, u64) {
        let entry = MessageEntry::new(payload);
        let id = entry.id;
        let mut log = self.log.write().expect("partition log lock poisoned");
        let offset = log.len() as u64;
        log.push(entry);
        (id, offset)
    }

    pub fn len(&self) -> u64 {
        self.log.read().expect("partition log lock poisoned").len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read-only access to the entry at `offset`, if produced.
    pub fn with_entry<T>(&self, offset: u64, f: impl FnOnce(&MessageEntry) -> T) -> Option<T> {
        let log = self.log.read().expect("partition log lock poisoned");
        log.get(offset as usize).map(f)
    }

    /// Mutable access to the entry at `offset`, if produced.
    pub fn with_entry_mut<T>(
        &self,
        offset: u64,
        f: impl FnOnce(&mut MessageEntry) -> T,
    ) -> Option<T> {
        let mut log = self.log.write().expect("partition log lock poisoned");
        log.get_mut(offset as usize).map(f)
    }

    /// Fold over all entries under a single read lock. Used by the metrics
    /// aggregator so each message is counted from one consistent state.
    pub fn fold_entries<A>(&self, init: A, mut f: impl FnMut(A, &MessageEntry) -> A) -> A {
        let log = self.log.read().expect("partition log lock poisoned");
        log.iter().fold(init, |acc, entry| f(acc, entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::message::MessageState;
    use serde_json::json;

    #[test]
    fn appends_are_ordered_within_a_partition() {
        let partition = Partition::new(0);
        let (_, first) = partition.append(json!({"n": 1}));
        let (_, second) = partition.append(json!({"n": 2}));
        let (_, third) = partition.append(json!({"n": 3}));

        assert_eq!((first, second, third), (0, 1, 2));
        assert_eq!(partition.len(), 3);
        let n = partition.with_entry(1, |e| e.payload["n"].as_i64()).unwrap();
        assert_eq!(n, Some(2));
    }

    #[test]
    fn unproduced_offset_is_not_available() {
        let partition = Partition::new(0);
        partition.append(json!({}));
        assert!(partition.with_entry(1, |_| ()).is_none());
    }

    #[test]
    fn entry_state_is_mutable_in_place() {
        let partition = Partition::new(0);
        let (_, offset) = partition.append(json!({}));
        partition
            .with_entry_mut(offset, |e| e.state = MessageState::Leased)
            .unwrap();
        let state = partition.with_entry(offset, |e| e.state).unwrap();
        assert_eq!(state, MessageState::Leased);
    }
}
