//! Common test utilities for integration tests
//!
//! Runs the full router against the in-memory store, so the tests exercise
//! routing, middleware, authorization and the consistency rules without any
//! external infrastructure.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use tower::Service as _;
use uuid::Uuid;

use taskhive_api::app::{build_router, AppState};
use taskhive_api::config::{ApiConfig, AuthConfig, Config, DatabaseConfig};
use taskhive_core::models::Role;
use taskhive_core::store::{MemStore, Store};

pub const SUPER_ADMIN_EMAIL: &str = "SuperAdmin@gmail.com";

/// Test context: the router plus direct store access for fixtures
pub struct TestContext {
    pub app: axum::Router,
    pub store: Arc<MemStore>,
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(MemStore::new());

        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig {
                url: "postgresql://unused-in-tests/taskhive".to_string(),
                max_connections: 1,
            },
            auth: AuthConfig {
                jwt_secret: "integration-test-secret-32-bytes-min!".to_string(),
                access_ttl_minutes: 15,
                refresh_ttl_days: 7,
                super_admin_email: SUPER_ADMIN_EMAIL.to_string(),
            },
        };

        let state = AppState::new(store.clone(), config);
        let app = build_router(state);

        Self { app, store }
    }

    /// Sends a request and returns (status, parsed JSON body).
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, json)
    }

    /// Registers a user through the API, returning the created record.
    pub async fn register(&self, full_name: &str, email: &str, password: &str) -> Value {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/v1/users/register",
                None,
                Some(json!({
                    "full_name": full_name,
                    "email": email,
                    "password": password,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        body
    }

    /// Logs in through the API, returning (access_token, refresh_token).
    pub async fn login(&self, email: &str, password: &str) -> (String, String) {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/v1/users/login",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");

        (
            body["access_token"].as_str().unwrap().to_string(),
            body["refresh_token"].as_str().unwrap().to_string(),
        )
    }

    /// Registers + logs in, returning (user_id, access_token).
    pub async fn signed_in_user(&self, full_name: &str, email: &str, password: &str) -> (Uuid, String) {
        let user = self.register(full_name, email, password).await;
        let id: Uuid = user["id"].as_str().unwrap().parse().unwrap();
        let (access, _) = self.login(email, password).await;
        (id, access)
    }

    /// Rewrites a user's role directly in the store, bypassing the API.
    pub async fn set_role(&self, user_id: Uuid, role: Role) {
        let mut user = self.store.find_user_by_id(user_id).await.unwrap().unwrap();
        user.role = role;
        self.store.update_user(&user).await.unwrap();
    }

    /// Creates a task list through the API, returning its id.
    pub async fn create_list(&self, token: &str, name: &str) -> Uuid {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/v1/task-lists/create",
                Some(token),
                Some(json!({ "name": name })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create list failed: {body}");
        body["id"].as_str().unwrap().parse().unwrap()
    }

    /// Creates a task through the API, returning its id.
    pub async fn create_task(&self, token: &str, list_id: Uuid, title: &str) -> Uuid {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/v1/tasks/create",
                Some(token),
                Some(json!({
                    "title": title,
                    "due_date": "2026-09-01T12:00:00Z",
                    "task_list": list_id,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create task failed: {body}");
        body["id"].as_str().unwrap().parse().unwrap()
    }
}
