//! Router-level test harness over an in-memory bank.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use pocketbank_core::testing::TestBank;
use pocketbank_shared::types::UserId;
use pocketbank_shared::{JwtConfig, JwtService};
use serde_json::Value;
use tower::ServiceExt;

use crate::{AppState, create_router};

pub(crate) struct TestApp {
    pub bank: TestBank,
    router: Router,
    jwt: Arc<JwtService>,
}

pub(crate) struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        let bank = TestBank::new();
        let jwt = Arc::new(JwtService::new(JwtConfig {
            secret: "api-test-secret".to_string(),
            access_token_expires_minutes: 15,
        }));
        let router = create_router(AppState {
            services: bank.services.clone(),
            jwt: Arc::clone(&jwt),
        });
        Self { bank, router, jwt }
    }

    pub fn token(&self, user: UserId) -> String {
        self.jwt.issue_token(user, "Test User").unwrap()
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        self.send_with_key(method, uri, token, body, None).await
    }

    pub async fn send_with_key(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
        idempotency_key: Option<&str>,
    ) -> TestResponse {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(key) = idempotency_key {
            request = request.header("Idempotency-Key", key);
        }
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }
}
