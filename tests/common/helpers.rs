// tests/common/helpers.rs
//! Shared helpers for integration tests. The router runs on the in-memory
//! store so no database is needed.
#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{self, Request, StatusCode},
};
use forum_web::{
    AppState,
    auth::Claims,
    config::Config,
    create_app,
    models::{Forum, NewUser, Post, User},
    store::{ForumStore, MemoryStore},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration-test-secret";

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        database_max_connections: 1,
        jwt_secret: JWT_SECRET.to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        allowed_origins: vec!["http://localhost:3000".to_string()],
        app_url: "http://localhost:3000".to_string(),
        pagination_results: 10,
        max_page_size: 50,
        top_communities_limit: 5,
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
}

pub fn create_test_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(store.clone(), test_config());
    TestApp {
        router: create_app(state),
        store,
    }
}

/// Creates a user directly in the store and returns it with a bearer token.
pub async fn create_test_user(app: &TestApp, username: &str) -> (User, String) {
    let user = app
        .store
        .create_user(NewUser {
            username: username.to_string(),
            name: Some(format!("{} name", username)),
            email: Some(format!("{}@example.com", username)),
            image: None,
        })
        .await
        .unwrap();
    let (token, _) = Claims::new(user.id, user.username.clone(), JWT_SECRET).unwrap();
    (user, token)
}

pub async fn create_test_forum(app: &TestApp, token: &str, name: &str) -> Forum {
    let (status, body) = send(app, "POST", "/api/forum", Some(token), Some(json!({ "name": name }))).await;
    assert_eq!(status, StatusCode::CREATED, "create forum failed: {body}");
    serde_json::from_value(body).unwrap()
}

pub async fn subscribe(app: &TestApp, token: &str, forum_id: Uuid) {
    let (status, body) = send(
        app,
        "POST",
        "/api/forum/subscribe",
        Some(token),
        Some(json!({ "forumId": forum_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "subscribe failed: {body}");
}

pub async fn create_test_post(app: &TestApp, token: &str, forum_id: Uuid, title: &str) -> Post {
    let (status, body) = send(
        app,
        "POST",
        "/api/forum/post/create",
        Some(token),
        Some(json!({
            "title": title,
            "forumId": forum_id,
            "content": {
                "time": 1700000000000u64,
                "blocks": [{ "type": "paragraph", "data": { "text": format!("Body of {}", title) } }],
                "version": "2.28.0"
            }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create post failed: {body}");
    serde_json::from_value(body).unwrap()
}

/// Sends a JSON request through the router and returns status and body.
/// Non-JSON bodies come back as a JSON string.
pub async fn send(
    app: &TestApp,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header(http::header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

    (status, value)
}

/// GET returning the raw body text, for HTML pages.
pub async fn get_page(app: &TestApp, uri: &str, token: Option<&str>) -> (StatusCode, String) {
    let mut builder = Request::builder().method(http::Method::GET).uri(uri);
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let response = app
        .router
        .clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8_lossy(&bytes).into_owned())
}
