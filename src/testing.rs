//! Shared fixtures for HTTP-level tests.

use std::{sync::Arc, time::Duration};

use anyhow::bail;
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tokio::sync::Mutex;
use tower::ServiceExt;

use crate::{
    app::build_app,
    config::{AppConfig, Environment, JwtConfig},
    mailer::Mailer,
    memory::MemoryStore,
    state::AppState,
};

pub(crate) fn test_config() -> AppConfig {
    AppConfig {
        database_url: None,
        jwt: JwtConfig {
            secret: "test-secret".into(),
            issuer: "inkwell".into(),
            audience: "inkwell-users".into(),
            ttl: Duration::from_secs(7 * 24 * 60 * 60),
        },
        client_url: "http://localhost:5173".into(),
        environment: Environment::Development,
        mail: None,
        host: "127.0.0.1".into(),
        port: 0,
    }
}

/// Records every reset mail attempt; reports delivery failure when `fail` is set.
#[derive(Default)]
pub(crate) struct FakeMailer {
    pub fail: bool,
    pub sent: Mutex<Vec<(String, String)>>,
}

impl FakeMailer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl Mailer for FakeMailer {
    async fn send_password_reset(&self, to: &str, reset_url: &str) -> anyhow::Result<()> {
        self.sent
            .lock()
            .await
            .push((to.to_string(), reset_url.to_string()));
        if self.fail {
            bail!("smtp unavailable");
        }
        Ok(())
    }
}

pub(crate) struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub mailer: Arc<FakeMailer>,
}

pub(crate) fn test_app_with(config: AppConfig, mailer: FakeMailer) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let mailer = Arc::new(mailer);
    let state = AppState::from_parts(config, store.clone(), store.clone(), store, mailer.clone());
    TestApp {
        router: build_app(state.clone()),
        state,
        mailer,
    }
}

pub(crate) fn test_app() -> TestApp {
    test_app_with(test_config(), FakeMailer::default())
}

impl TestApp {
    /// Sends one request and returns the status with the body parsed as JSON
    /// (non-JSON bodies come back as a JSON string).
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(json) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };

        let res = self.router.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    /// Registers a user and returns `(token, id)`.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> (String, String) {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/auth/register",
                None,
                Some(serde_json::json!({ "name": name, "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        (
            body["token"].as_str().unwrap().to_string(),
            body["user"]["id"].as_str().unwrap().to_string(),
        )
    }
}
