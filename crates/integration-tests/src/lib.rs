//! Integration tests for Plated.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot`, backed
//! by the in-memory account store and `tower_sessions::MemoryStore`, so the
//! default test run needs no database.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p plated-integration-tests
//!
//! # Include the PostgreSQL store tests
//! PLATED_TEST_DATABASE_URL=postgres://localhost/plated_test \
//!     cargo test -p plated-integration-tests -- --ignored
//! ```

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;
use tower_sessions::MemoryStore;

use plated_server::config::{LogFormat, ServerConfig};
use plated_server::db::MemoryAccountStore;
use plated_server::state::AppState;

/// Password satisfying every strength rule.
pub const PASSWORD: &str = "TestPass123!";

/// Build a registration request body.
#[must_use]
pub fn registration(name: &str, email: &str, role: &str) -> Value {
    json!({
        "name": name,
        "email": email,
        "password": PASSWORD,
        "confirm": PASSWORD,
        "role": role,
    })
}

/// Config for tests: plain http, no rate limiting.
#[must_use]
pub fn test_config() -> ServerConfig {
    ServerConfig {
        database_url: SecretString::from("postgres://unused/plated_test"),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        base_url: url::Url::parse("http://localhost:3000").unwrap(),
        auth_rate_limit: false,
        log_format: LogFormat::Pretty,
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// An application instance over fresh in-memory stores.
pub struct TestApp {
    /// The account store behind the router, for seeding and row counts.
    pub store: MemoryAccountStore,
    router: Router,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        let store = MemoryAccountStore::new();
        let state = AppState::new(test_config(), Arc::new(store.clone()));
        let router = plated_server::app(state, MemoryStore::default());
        Self { store, router }
    }

    /// A client with its own cookie jar.
    #[must_use]
    pub fn client(&self) -> TestClient {
        TestClient {
            router: self.router.clone(),
            cookie: None,
        }
    }
}

/// Sends requests to the router, carrying the session cookie between them.
pub struct TestClient {
    router: Router,
    cookie: Option<String>,
}

impl TestClient {
    pub async fn get(&mut self, path: &str) -> TestResponse {
        self.send(Method::GET, path, None).await
    }

    pub async fn post(&mut self, path: &str, body: &Value) -> TestResponse {
        self.send(Method::POST, path, Some(body)).await
    }

    /// Register then log in, returning the login response.
    pub async fn register_and_login(&mut self, name: &str, email: &str, role: &str) -> TestResponse {
        let registered = self.post("/auth/register", &registration(name, email, role)).await;
        assert_eq!(registered.status, StatusCode::CREATED, "{}", registered.text());
        self.post(
            "/auth/login",
            &json!({ "email": email, "password": PASSWORD }),
        )
        .await
    }

    async fn send(&mut self, method: Method, path: &str, body: Option<&Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
        {
            self.cookie = if set_cookie.contains("Max-Age=0") {
                None
            } else {
                set_cookie.split(';').next().map(str::to_owned)
            };
        }

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// A buffered response.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Target of a redirect response.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }
}
