/// In-process stand-in for the TaskDeck server
///
/// Implements just enough of the auth and task endpoints to drive the session
/// controller: a single valid access token at a time, a refresh endpoint that
/// can be switched off, and counters for refresh and logout calls.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::CookieJar;
use serde_json::{json, Value};

pub const PASSWORD: &str = "pw";

const SET_REFRESH: &str = "refreshToken=stub-refresh; Path=/; HttpOnly";
const CLEAR_REFRESH: &str = "refreshToken=; Path=/; HttpOnly; Max-Age=0";

#[derive(Default)]
pub struct Stub {
    pub refresh_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
    refresh_disabled: AtomicBool,
    issued: AtomicUsize,
    valid_token: Mutex<Option<String>>,
}

impl Stub {
    fn issue(&self) -> String {
        let token = format!("access-{}", self.issued.fetch_add(1, Ordering::SeqCst));
        *self.valid_token.lock().unwrap() = Some(token.clone());
        token
    }

    /// Invalidates the current access token, as if it expired
    pub fn expire_access_token(&self) {
        *self.valid_token.lock().unwrap() = None;
    }

    /// Makes every refresh fail, as if the refresh token expired
    pub fn disable_refresh(&self) {
        self.refresh_disabled.store(true, Ordering::SeqCst);
    }

    pub fn refreshes(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn logouts(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }

    fn check_bearer(&self, headers: &HeaderMap) -> Result<(), Response> {
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        let Some(token) = token else {
            return Err(error(StatusCode::UNAUTHORIZED, "Access token required"));
        };

        if self.valid_token.lock().unwrap().as_deref() != Some(token) {
            return Err(error(StatusCode::FORBIDDEN, "Invalid or expired token"));
        }

        Ok(())
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    let code = status.canonical_reason().unwrap_or("Error");
    (status, Json(json!({ "error": code, "message": message }))).into_response()
}

fn user() -> Value {
    json!({ "id": 1, "email": "lin@example.com", "name": "Lin", "role": "user" })
}

async fn login(State(stub): State<Arc<Stub>>, Json(body): Json<Value>) -> Response {
    if body["password"] != PASSWORD {
        return error(StatusCode::UNAUTHORIZED, "Invalid credentials");
    }

    let token = stub.issue();
    (
        [(header::SET_COOKIE, SET_REFRESH)],
        Json(json!({ "accessToken": token, "user": user() })),
    )
        .into_response()
}

async fn refresh(State(stub): State<Arc<Stub>>, jar: CookieJar) -> Response {
    stub.refresh_calls.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(50)).await;

    if jar.get("refreshToken").is_none() {
        return error(StatusCode::FORBIDDEN, "Refresh token required");
    }
    if stub.refresh_disabled.load(Ordering::SeqCst) {
        return error(StatusCode::FORBIDDEN, "Invalid refresh token");
    }

    let token = stub.issue();
    Json(json!({ "accessToken": token, "user": user() })).into_response()
}

async fn logout(State(stub): State<Arc<Stub>>) -> Response {
    stub.logout_calls.fetch_add(1, Ordering::SeqCst);
    (
        [(header::SET_COOKIE, CLEAR_REFRESH)],
        Json(json!({ "message": "Logged out successfully" })),
    )
        .into_response()
}

async fn tasks(State(stub): State<Arc<Stub>>, headers: HeaderMap) -> Response {
    if let Err(response) = stub.check_bearer(&headers) {
        return response;
    }

    Json(json!({ "tasks": [], "total": 0, "page": 1, "totalPages": 0 })).into_response()
}

async fn admin_stats(State(stub): State<Arc<Stub>>, headers: HeaderMap) -> Response {
    if let Err(response) = stub.check_bearer(&headers) {
        return response;
    }

    error(StatusCode::FORBIDDEN, "Admin access required")
}

/// Serves the stub on an ephemeral port
pub async fn spawn() -> (String, Arc<Stub>) {
    let stub = Arc::new(Stub::default());

    let app = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/logout", post(logout))
        .route("/api/tasks", get(tasks))
        .route("/api/admin/stats", get(admin_stats))
        .with_state(stub.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), stub)
}

/// A base URL nothing listens on
pub fn unreachable_url() -> String {
    "http://127.0.0.1:1".to_string()
}
