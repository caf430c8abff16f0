/// Common test utilities for integration tests
///
/// Builds the full router over an in-memory store, with a cheap Argon2
/// configuration so that registration in tests stays fast.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tasktrack_api::{
    app::{build_router, AppState},
    config::{ApiConfig, Config, DatabaseConfig, JwtConfig},
};
use tasktrack_shared::{auth::password::Argon2Hasher, store::memory::MemoryStore};
use tower::ServiceExt;
use uuid::Uuid;

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            production: false,
        },
        database: DatabaseConfig {
            url: "postgresql://unused".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            // Deliberately weak; the codec derives a full-length key from it
            secret: "test".to_string(),
            expiration_seconds: 3600,
        },
    }
}

/// Registered account as seen by a test
pub struct TestUser {
    pub id: Uuid,
    pub token: String,
}

pub struct TestContext {
    pub app: Router,
}

impl TestContext {
    pub fn new() -> Self {
        let hasher = Argon2Hasher::with_params(4096, 1, 1).expect("valid argon2 params");
        let state = AppState::with_hasher(
            Arc::new(MemoryStore::new()),
            test_config(),
            Arc::new(hasher),
        );

        Self {
            app: build_router(state),
        }
    }

    /// Sends one request through the router and decodes the JSON body
    ///
    /// Empty bodies decode as `Value::Null`.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                panic!("non-JSON body: {}", String::from_utf8_lossy(&bytes))
            })
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    /// Registers `username` with a derived email and a fixed password
    pub async fn register(&self, username: &str) -> TestUser {
        let (status, body) = self
            .request(
                Method::POST,
                "/v1/auth/register",
                None,
                Some(serde_json::json!({
                    "username": username,
                    "email": format!("{}@example.com", username),
                    "password": "password123",
                })),
            )
            .await;

        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

        TestUser {
            id: body["user"]["id"].as_str().unwrap().parse().unwrap(),
            token: body["token"].as_str().unwrap().to_string(),
        }
    }
}

/// Extracts an id field from a JSON body
pub fn id_of(body: &Value) -> Uuid {
    body["id"].as_str().unwrap().parse().unwrap()
}
