// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, Response};
use chrono::{Duration, Utc};
use plan_tracker::config::Config;
use plan_tracker::db::{FirestoreDb, MemoryStore};
use plan_tracker::routes::create_router;
use plan_tracker::services::{JwtCodec, Registration, TokenCodec, TokenPayload};
use plan_tracker::AppState;
use std::sync::Arc;
use uuid::Uuid;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a test app backed by a fresh in-memory store.
/// Returns the router, the shared state, and the store itself.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let state = Arc::new(
        AppState::new(Config::test_default(), store.clone()).expect("test key is long enough"),
    );

    (create_router(state.clone()), state, store)
}

/// Sign an access token with the test configuration's key.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: Uuid, username: &str, duration: Duration) -> String {
    let codec = JwtCodec::new(&Config::test_default().token_symmetric_key).unwrap();
    let (token, _) = codec.generate(user_id, username, duration).unwrap();
    token
}

/// Sign a token whose expiry passed a minute ago.
#[allow(dead_code)]
pub fn create_expired_jwt(user_id: Uuid, username: &str) -> String {
    let codec = JwtCodec::new(&Config::test_default().token_symmetric_key).unwrap();
    let now = Utc::now();
    let payload = TokenPayload {
        id: Uuid::new_v4(),
        user_id,
        username: username.to_string(),
        issued_at: now - Duration::minutes(16),
        expires_at: now - Duration::minutes(1),
    };
    codec.sign(&payload).unwrap()
}

/// Registration for a user with predictable fields.
#[allow(dead_code)]
pub fn registration(username: &str) -> Registration {
    Registration {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        password: "secret123".to_string(),
    }
}

/// Build a JSON request, optionally with a bearer token.
#[allow(dead_code)]
pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Collect a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
