//! Common test utilities for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request},
    Router,
};

use engine::{GeofenceEngine, LogNotifier};
use fleetguard_api::{app::create_app, config::Config};

/// Build an app wired to a fresh in-memory engine. The engine handle is
/// returned so tests can inspect state directly when polling over HTTP
/// would be awkward.
pub fn create_test_app() -> (Router, Arc<GeofenceEngine>) {
    let config = Config::load_for_test(&[]).expect("Failed to load test config");
    let engine = Arc::new(GeofenceEngine::new(
        config.engine.clone(),
        Arc::new(LogNotifier::new()),
    ));
    (create_app(config, engine.clone()), engine)
}

/// Build a JSON request.
pub fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Build a GET request.
pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Build a DELETE request.
pub fn delete_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Helper to parse JSON response body.
pub async fn parse_response_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
}
