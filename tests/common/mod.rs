#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Request, StatusCode, header},
    response::Response,
};
use serde_json::Value;
use tokengate::demo::DemoPolicy;
use tokengate::{Clock, GateBuilder, JwtGate, create_app};
use tower::ServiceExt;

pub const SECRET: &str = "integration-secret-that-is-long-enough";
pub const T0: i64 = 1_700_000_000;

/// Test clock that only moves when told to.
#[derive(Clone)]
pub struct ManualClock(Arc<AtomicI64>);

impl ManualClock {
    pub fn new(start: i64) -> Self {
        Self(Arc::new(AtomicI64::new(start)))
    }

    pub fn set(&self, now: i64) {
        self.0.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: i64) {
        self.0.fetch_add(secs, Ordering::SeqCst);
    }

    pub fn clock(&self) -> Clock {
        let inner = self.0.clone();
        Arc::new(move || inner.load(Ordering::SeqCst))
    }
}

/// Demo gate with the shared secret and a manual clock at `T0`.
pub fn demo_builder(clock: &ManualClock) -> GateBuilder<DemoPolicy> {
    JwtGate::builder(DemoPolicy::default())
        .secret(SECRET)
        .clock(clock.clock())
}

pub fn demo_app(builder: GateBuilder<DemoPolicy>) -> Router {
    create_app(Arc::new(builder.build().unwrap()))
}

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn login_request(username: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(format!(
            r#"{{"username":"{}","password":"{}"}}"#,
            username, password
        )))
        .unwrap()
}

/// Log in and return (status, body, headers).
pub async fn login(app: &Router, username: &str, password: &str) -> (StatusCode, Value, HeaderMap) {
    let response = send(app, login_request(username, password)).await;
    let status = response.status();
    let headers = response.headers().clone();
    (status, body_json(response).await, headers)
}

/// Log in as admin and return the token.
pub async fn admin_token(app: &Router) -> String {
    let (status, body, _) = login(app, "admin", "admin").await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["token"].as_str().unwrap().to_string()
}

pub fn bearer(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

/// Value of the first Set-Cookie header.
pub fn set_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
