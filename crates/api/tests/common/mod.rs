#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use chrono::{Offset, Utc};
use http_body_util::BodyExt;
use tower::ServiceExt;

use routinely_api::config::ServerConfig;
use routinely_api::router::build_app_router;
use routinely_api::state::AppState;
use routinely_store::{MemoryStore, SeedData};

/// Two users. User 1 owns four routines across two groups plus one
/// ungrouped routine and one archived routine; user 2 owns a single daily
/// routine. 2024-01-01 is a Monday.
pub const FIXTURE: &str = r#"{
    "groups": [
        {"id": 10, "user_id": 1, "name": "Morning", "time_range": "06:00-09:00"},
        {"id": 20, "user_id": 1, "name": "Evening"}
    ],
    "routines": [
        {"id": 1, "user_id": 1, "name": "Stretch", "priority": "high",
         "expected_time": "07:00", "group_id": 10, "created_at": "2023-12-01T00:00:00Z"},
        {"id": 2, "user_id": 1, "name": "Read", "priority": "low",
         "expected_time": "21:00", "group_id": 20, "created_at": "2023-12-01T00:00:00Z"},
        {"id": 3, "user_id": 1, "name": "Vitamins", "priority": "medium",
         "created_at": "2023-12-01T00:00:00Z"},
        {"id": 4, "user_id": 1, "name": "Old habit", "priority": "low",
         "archived": true, "archived_at": "2024-01-02T12:00:00Z",
         "created_at": "2023-12-01T00:00:00Z"},
        {"id": 5, "user_id": 2, "name": "Walk", "priority": "high",
         "created_at": "2023-12-01T00:00:00Z"}
    ],
    "schedules": [
        {"routine_id": 1, "monday": true, "wednesday": true, "friday": true},
        {"routine_id": 2, "monday": true, "tuesday": true, "wednesday": true, "thursday": true,
         "friday": true, "saturday": true, "sunday": true},
        {"routine_id": 3, "monday": true, "tuesday": true, "wednesday": true, "thursday": true,
         "friday": true, "saturday": true, "sunday": true},
        {"routine_id": 4, "monday": true, "tuesday": true, "wednesday": true, "thursday": true,
         "friday": true, "saturday": true, "sunday": true},
        {"routine_id": 5, "monday": true, "tuesday": true, "wednesday": true, "thursday": true,
         "friday": true, "saturday": true, "sunday": true}
    ],
    "completions": [
        {"id": 1, "routine_id": 1, "user_id": 1, "completed_at": "2024-01-03T07:05:00Z"},
        {"id": 2, "routine_id": 3, "user_id": 1, "completed_at": "2024-01-03T08:00:00Z"},
        {"id": 3, "routine_id": 3, "user_id": 1, "completed_at": "2024-01-03T09:30:00Z"},
        {"id": 4, "routine_id": 5, "user_id": 2, "completed_at": "2024-01-03T06:00:00Z"}
    ]
}"#;

/// Build a test `ServerConfig` with safe defaults and a UTC offset.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        utc_offset: Utc.fix(),
        seed_path: None,
        cache_capacity: 64,
    }
}

/// Store seeded with [`FIXTURE`].
pub async fn fixture_store() -> Arc<MemoryStore> {
    let seed = SeedData::from_json(FIXTURE).unwrap();
    Arc::new(MemoryStore::from_seed(seed).await.unwrap())
}

/// Build the full application router around `store`, using the same
/// middleware stack as the binary.
pub fn build_test_app(store: Arc<MemoryStore>) -> Router {
    build_test_app_with(store, test_config())
}

pub fn build_test_app_with(store: Arc<MemoryStore>, config: ServerConfig) -> Router {
    let state = AppState::new(store, config.clone());
    build_app_router(state, &config)
}

/// Router over [`fixture_store`].
pub async fn fixture_app() -> Router {
    build_test_app(fixture_store().await)
}

async fn send(app: Router, method: Method, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri).await
}

pub async fn put(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::PUT, uri).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
