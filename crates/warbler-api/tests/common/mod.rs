// Common test utilities for HTTP-level tests

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tower::ServiceExt;

use warbler_api::{AppState, AppStateInner, router, session_layer};
use warbler_crypto::Argon2Hasher;
use warbler_db::{Database, User};

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
}

/// Router over a fresh in-memory store, with a cheap hasher.
pub fn setup_app() -> TestApp {
    let db = Database::open_in_memory().expect("Failed to create test database");
    let hasher = Argon2Hasher::with_params(1024, 1).expect("Failed to build test hasher");
    let state = AppStateInner::new(db, hasher);

    let app = router(state.clone()).layer(session_layer(false, time::Duration::minutes(10)));
    TestApp { app, state }
}

impl TestApp {
    /// Signs a user up directly through the store and commits.
    pub fn signup(&self, username: &str, email: &str, password: &str) -> User {
        let mut tx = self.state.db.session();
        let user = warbler_db::signup(&mut tx, self.state.hasher.as_ref(), username, email, password, None)
            .expect("signup failed");
        tx.commit().expect("commit failed");
        user
    }

    pub async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(req).await.expect("request failed")
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        self.send(build(uri, "GET", cookie, None)).await
    }

    pub async fn post(&self, uri: &str, cookie: Option<&str>, body: Option<Value>) -> Response<Body> {
        self.send(build(uri, "POST", cookie, body)).await
    }

    /// Logs in through the API and returns the session cookie.
    pub async fn login(&self, username: &str, password: &str) -> String {
        let resp = self
            .post(
                "/login",
                None,
                Some(serde_json::json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        session_cookie(&resp).expect("login did not set a session cookie")
    }
}

fn build(uri: &str, method: &str, cookie: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// `name=value` part of the Set-Cookie header, if any.
pub fn session_cookie(resp: &Response<Body>) -> Option<String> {
    resp.headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

pub async fn json_body<T: DeserializeOwned>(resp: Response<Body>) -> T {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("response body is not the expected JSON")
}
