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

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use oxqueue::configs::{DeliveryConfig, HttpConfig};
use oxqueue::http::build_router;
use oxqueue::queue::QueueEngine;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    let engine = Arc::new(QueueEngine::new(&DeliveryConfig::default()));
    build_router(engine, &HttpConfig::default())
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn full_lifecycle_over_http() {
    let app = app();

    let (status, topic) = send(
        &app,
        post("/api/topics", json!({"name": "user-events", "partitions": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(topic["name"], "user-events");
    assert_eq!(topic["partitions"], json!([0, 1, 2]));

    let (status, produced) = send(
        &app,
        post(
            "/api/produce",
            json!({"topic": "user-events", "payload": {"user": "alice", "action": "login"}}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = produced["id"].as_str().unwrap().to_string();
    assert!(produced["partition"].as_u64().unwrap() < 3);
    assert_eq!(produced["status"], "pending");

    let (status, consumed) = send(
        &app,
        get("/api/consume?topic=user-events&group=email-service"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(consumed[0]["id"].as_str().unwrap(), id);
    assert_eq!(consumed[0]["payload"]["user"], "alice");

    let (status, acked) = send(
        &app,
        post("/api/ack", json!({"message_id": id, "status": "acknowledged"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(acked["state"], "acknowledged");

    // Second acknowledge is rejected, not silently absorbed.
    let (status, _) = send(
        &app,
        post("/api/ack", json!({"message_id": id, "status": "acknowledged"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, metrics) = send(&app, get("/api/dashboard")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(metrics["total_messages"], 1);
    assert_eq!(metrics["acknowledged_messages"], 1);
}

#[tokio::test]
async fn consume_on_empty_topic_is_204_not_an_error() {
    let app = app();
    send(
        &app,
        post("/api/topics", json!({"name": "empty", "partitions": 1})),
    )
    .await;

    let (status, body) = send(&app, get("/api/consume?topic=empty&group=g1")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    // Unknown topic is a 404, clearly distinguishable from the empty case.
    let (status, _) = send(&app, get("/api/consume?topic=missing&group=g1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn validation_errors_are_rejected_at_the_boundary() {
    let app = app();

    let (status, _) = send(
        &app,
        post("/api/topics", json!({"name": "", "partitions": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        post("/api/topics", json!({"name": "t", "partitions": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        post(
            "/api/ack",
            json!({"message_id": uuid::Uuid::now_v7(), "status": "done"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        post("/api/produce", json!({"topic": "missing", "payload": {}})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Missing required fields are a 400, not an extractor rejection.
    let (status, _) = send(&app, post("/api/produce", json!({"topic": "missing"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&app, post("/api/produce", json!({"payload": {"n": 1}}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_topic_create_fails_loudly() {
    let app = app();
    let request = json!({"name": "orders", "partitions": 2});
    let (status, _) = send(&app, post("/api/topics", request.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(&app, post("/api/topics", request)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, topics) = send(&app, get("/api/topics")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(topics.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn batch_consume_is_capped_by_partition_count() {
    let app = app();
    send(
        &app,
        post("/api/topics", json!({"name": "events", "partitions": 2})),
    )
    .await;
    for n in 0..5 {
        send(
            &app,
            post("/api/produce", json!({"topic": "events", "payload": {"n": n}})),
        )
        .await;
    }

    let (status, batch) = send(&app, get("/api/consume?topic=events&group=g1&batch=10")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(batch.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn ping_answers_pong() {
    let app = app();
    let response = app.oneshot(get("/ping")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"pong");
}
