//! Integration tests for MiniMart Online.
//!
//! Both routers run in-process against one shared [`MemoryClient`] and
//! in-memory session stores, so the suite needs neither `PostgreSQL` nor
//! a running server:
//!
//! ```bash
//! cargo test -p minimart-integration-tests
//! ```
//!
//! [`Store`] owns the shared data; [`TestApp`] wraps one router with a
//! single-cookie jar so consecutive requests share a session.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc)]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;
use tower_sessions::MemoryStore;

use minimart_admin::config::AdminConfig;
use minimart_backend::{DataClient, MemoryClient};
use minimart_core::UserRole;
use minimart_storefront::config::StorefrontConfig;

/// Session signing secret shared by both test apps.
const SESSION_SECRET: &str =
    "kq8ZtR2vXw5nLp0sYb7hJc4mGd9fUe3aWi6oTr1xNz8yQv2uBl5kHj0gFs7dMc4e";

pub const ADMIN_EMAIL: &str = "admin@minimart.ph";
pub const ADMIN_PASSWORD: &str = "sari-sari-store-2024";

/// A fully-read response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    /// Parse the body as JSON.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body is not JSON")
    }

    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).expect("response body is not UTF-8")
    }

    #[must_use]
    pub fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// One router plus the session cookie it last handed out.
pub struct TestApp {
    router: Router,
    cookie: Option<String>,
}

impl TestApp {
    const fn new(router: Router) -> Self {
        Self {
            router,
            cookie: None,
        }
    }

    /// Send a request, remembering any session cookie in the response.
    pub async fn send(&mut self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("invalid request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        if let Some(set_cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
        {
            let pair = set_cookie.split(';').next().unwrap_or_default().to_owned();
            self.cookie = Some(pair);
        }

        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read body")
            .to_vec();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&mut self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&mut self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&mut self, uri: &str) -> TestResponse {
        self.send(Method::DELETE, uri, None).await
    }

    /// Forget the session cookie, as a new browser would.
    pub fn clear_cookie(&mut self) {
        self.cookie = None;
    }
}

/// Shared in-memory data behind both apps.
pub struct Store {
    pub client: Arc<MemoryClient>,
    admin_state: minimart_admin::state::AppState,
    storefront_state: minimart_storefront::state::AppState,
}

impl Store {
    /// An empty store with one admin account.
    pub async fn new() -> Self {
        let client = Arc::new(MemoryClient::new());
        let shared: Arc<dyn DataClient> = client.clone();

        let admin_state = minimart_admin::state::AppState::new(admin_config(), Arc::clone(&shared));
        let storefront_state =
            minimart_storefront::state::AppState::new(storefront_config(), shared);

        admin_state
            .auth()
            .create_user(
                ADMIN_EMAIL,
                ADMIN_PASSWORD,
                Some("Store Admin"),
                UserRole::Admin,
            )
            .await
            .expect("failed to create admin");

        Self {
            client,
            admin_state,
            storefront_state,
        }
    }

    /// A fresh storefront client with no session.
    #[must_use]
    pub fn storefront(&self) -> TestApp {
        let router = minimart_storefront::app(self.storefront_state.clone(), MemoryStore::default())
            .expect("failed to build storefront");
        TestApp::new(router)
    }

    /// A fresh admin client with no session.
    #[must_use]
    pub fn admin(&self) -> TestApp {
        let router = minimart_admin::app(self.admin_state.clone(), MemoryStore::default())
            .expect("failed to build admin");
        TestApp::new(router)
    }

    /// An admin client already signed in.
    pub async fn signed_in_admin(&self) -> TestApp {
        let mut admin = self.admin();
        let response = admin
            .post(
                "/api/auth/login",
                serde_json::json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "admin login failed");
        admin
    }

    /// An admin client signed in, with the sample catalog seeded.
    pub async fn seeded_admin(&self) -> TestApp {
        let mut admin = self.signed_in_admin().await;
        let response = admin.post("/api/setup/seed", Value::Null).await;
        assert_eq!(response.status, StatusCode::CREATED, "seeding failed");
        admin
    }

    /// A storefront client signed in as a freshly registered buyer.
    pub async fn registered_buyer(&self, email: &str) -> TestApp {
        let mut storefront = self.storefront();
        let response = storefront
            .post(
                "/api/auth/register",
                serde_json::json!({ "email": email, "password": "mabuhay-2024" }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "registration failed");
        storefront
    }
}

fn storefront_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://localhost/minimart_test"),
        host: [127, 0, 0, 1].into(),
        port: 3000,
        base_url: url::Url::parse("http://localhost:3000").expect("valid url"),
        session_secret: SecretString::from(SESSION_SECRET),
        delivery_fee: Decimal::new(5000, 2),
        rate_limit: false,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

fn admin_config() -> AdminConfig {
    AdminConfig {
        database_url: SecretString::from("postgres://localhost/minimart_test"),
        host: [127, 0, 0, 1].into(),
        port: 3001,
        base_url: "http://localhost:3001".to_owned(),
        session_secret: SecretString::from(SESSION_SECRET),
        rate_limit: false,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Read a decimal serialized as a JSON string.
#[must_use]
pub fn decimal(value: &Value) -> Decimal {
    value
        .as_str()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| panic!("not a decimal: {value}"))
}

/// Find a product id in a listing by name.
#[must_use]
pub fn product_id(products: &Value, name: &str) -> String {
    products
        .as_array()
        .and_then(|items| items.iter().find(|p| p["name"] == name))
        .and_then(|p| p["id"].as_str())
        .unwrap_or_else(|| panic!("no product named {name}"))
        .to_owned()
}
