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

use oxqueue::QueueError;
use oxqueue::configs::DeliveryConfig;
use oxqueue::queue::QueueEngine;
use serde_json::json;

fn engine() -> QueueEngine {
    QueueEngine::new(&DeliveryConfig::default())
}

#[test]
fn produce_consume_acknowledge_scenario() {
    let engine = engine();
    engine.create_topic("user-events", 3).unwrap();

    let payload = json!({"user": "alice", "action": "login"});
    let (id, partition, _) = engine.append("user-events", None, payload.clone()).unwrap();
    assert!(partition < 3);

    let message = engine.lease("user-events", "email-service").unwrap();
    assert_eq!(message.id, id);
    assert_eq!(message.payload, payload);
    assert_eq!(message.topic, "user-events");

    engine.acknowledge(id, "email-service").unwrap();
    assert!(matches!(
        engine.acknowledge(id, "email-service"),
        Err(QueueError::InvalidState(_))
    ));

    let metrics = engine.dashboard_metrics();
    assert_eq!(metrics.acknowledged_messages, 1);
    assert_eq!(metrics.total_messages, 1);
}

#[test]
fn retry_exhaustion_dead_letters_scenario() {
    let engine = engine();
    engine.create_topic("payments", 1).unwrap();
    let (id, _, _) = engine.append("payments", None, json!({"amount": 7})).unwrap();

    // max_retries is 3: four failures in total, re-leasing between each.
    for _ in 0..4 {
        let leased = engine.lease("payments", "g1").unwrap();
        assert_eq!(leased.id, id);
        engine.fail(id, "g1").unwrap();
    }

    let metrics = engine.dashboard_metrics();
    assert_eq!(metrics.dead_letter_messages, 1);
    assert_eq!(metrics.retryable_failed_messages, 0);

    // A dead-lettered message is never re-leased.
    assert!(matches!(
        engine.lease("payments", "g1"),
        Err(QueueError::NoMessageAvailable)
    ));
}

#[test]
fn consume_with_nothing_produced_is_distinguishable() {
    let engine = engine();
    engine.create_topic("empty-topic", 2).unwrap();
    let result = engine.lease("empty-topic", "g1");
    assert!(matches!(result, Err(QueueError::NoMessageAvailable)));
    // Unknown topic is a different condition entirely.
    assert!(matches!(
        engine.lease("no-such-topic", "g1"),
        Err(QueueError::TopicNotFound(_))
    ));
}

#[test]
fn metrics_conservation_holds_across_a_mixed_workload() {
    let engine = engine();

    // Drive one message into each bucket, plus two left pending.
    engine.create_topic("t-ack", 1).unwrap();
    let (acked, _, _) = engine.append("t-ack", None, json!({})).unwrap();
    engine.lease("t-ack", "g1").unwrap();
    engine.acknowledge(acked, "g1").unwrap();

    engine.create_topic("t-flight", 1).unwrap();
    engine.append("t-flight", None, json!({})).unwrap();
    engine.lease("t-flight", "g1").unwrap();

    engine.create_topic("t-retry", 1).unwrap();
    let (failed, _, _) = engine.append("t-retry", None, json!({})).unwrap();
    engine.lease("t-retry", "g1").unwrap();
    engine.fail(failed, "g1").unwrap();

    engine.create_topic("t-dead", 1).unwrap();
    let (dead, _, _) = engine.append("t-dead", None, json!({})).unwrap();
    for _ in 0..4 {
        engine.lease("t-dead", "g1").unwrap();
        engine.fail(dead, "g1").unwrap();
    }

    engine.create_topic("t-pending", 1).unwrap();
    engine.append("t-pending", None, json!({})).unwrap();
    engine.append("t-pending", None, json!({})).unwrap();

    let metrics = engine.dashboard_metrics();
    assert_eq!(metrics.total_messages, 6);
    assert_eq!(metrics.pending_messages, 2);
    assert_eq!(metrics.in_flight_messages, 1);
    assert_eq!(metrics.acknowledged_messages, 1);
    assert_eq!(metrics.retryable_failed_messages, 1);
    assert_eq!(metrics.dead_letter_messages, 1);
    assert!(metrics.is_conserved());
}

#[test]
fn independent_groups_consume_the_stream_independently() {
    let engine = engine();
    engine.create_topic("user-events", 1).unwrap();
    let (first, _, _) = engine.append("user-events", None, json!({"n": 1})).unwrap();
    let (second, _, _) = engine.append("user-events", None, json!({"n": 2})).unwrap();

    let g1 = engine.lease("user-events", "g1").unwrap();
    assert_eq!(g1.id, first);
    engine.acknowledge(first, "g1").unwrap();

    // g2 starts from its own cursor; the first message is already resolved,
    // so exactly-once-visible delivery hands g2 the second one.
    let g2 = engine.lease("user-events", "g2").unwrap();
    assert_eq!(g2.id, second);
    engine.acknowledge(second, "g2").unwrap();
}

#[test]
fn keyed_messages_preserve_partition_order_through_failures() {
    let engine = engine();
    engine.create_topic("orders", 4).unwrap();
    let (first, p1, _) = engine
        .append("orders", Some("customer-7"), json!({"seq": 1}))
        .unwrap();
    let (second, p2, _) = engine
        .append("orders", Some("customer-7"), json!({"seq": 2}))
        .unwrap();
    assert_eq!(p1, p2);

    // The first message must be fully resolved before the second is visible.
    let leased = engine.lease("orders", "g1").unwrap();
    assert_eq!(leased.id, first);
    engine.fail(first, "g1").unwrap();

    let redelivered = engine.lease("orders", "g1").unwrap();
    assert_eq!(redelivered.id, first);
    engine.acknowledge(first, "g1").unwrap();

    let next = engine.lease("orders", "g1").unwrap();
    assert_eq!(next.id, second);
}
