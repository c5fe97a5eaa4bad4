/// Common test utilities for integration tests
///
/// Each `TestContext` owns a fresh PostgreSQL schema with migrations applied
/// and a router wired to it. Tests skip themselves when `DATABASE_URL` is not
/// set.

use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use taskdeck_api::{
    app::{build_router, AppState},
    config::Config,
};
use tower::ServiceExt;

pub const ACCESS_SECRET: &str = "integration-access-secret-32-bytes-min";
pub const REFRESH_SECRET: &str = "integration-refresh-secret-32-bytes-min";

static SCHEMA_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: Router,
    admin: PgPool,
    schema: String,
}

/// Status, parsed JSON body, and any `Set-Cookie` header
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub set_cookie: Option<String>,
}

impl TestContext {
    pub async fn new() -> Option<Self> {
        let url = std::env::var("DATABASE_URL").ok()?;

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .subsec_nanos();
        let schema = format!(
            "api_test_{}_{}_{}",
            std::process::id(),
            nanos,
            SCHEMA_COUNTER.fetch_add(1, Ordering::SeqCst)
        );

        let admin = PgPoolOptions::new()
            .max_connections(1)
            .connect(&url)
            .await
            .expect("connect to DATABASE_URL");
        sqlx::query(&format!("CREATE SCHEMA {}", schema))
            .execute(&admin)
            .await
            .expect("create test schema");

        let options = PgConnectOptions::from_str(&url)
            .expect("parse DATABASE_URL")
            .options([("search_path", schema.as_str())]);
        let db = PgPoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .expect("connect to test schema");

        taskdeck_shared::db::migrations::run_migrations(&db)
            .await
            .expect("run migrations");

        let config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some(url.clone()),
            "JWT_ACCESS_SECRET" => Some(ACCESS_SECRET.to_string()),
            "JWT_REFRESH_SECRET" => Some(REFRESH_SECRET.to_string()),
            _ => None,
        })
        .expect("test config");

        let app = build_router(AppState::new(db.clone(), config));

        Some(Self {
            db,
            app,
            admin,
            schema,
        })
    }

    pub async fn cleanup(self) {
        self.db.close().await;
        sqlx::query(&format!("DROP SCHEMA {} CASCADE", self.schema))
            .execute(&self.admin)
            .await
            .expect("drop test schema");
    }

    /// Sends a request through the router
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
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
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            body,
            set_cookie,
        }
    }

    pub async fn register(&self, email: &str, password: &str) -> TestResponse {
        self.request(
            Method::POST,
            "/api/auth/register",
            None,
            None,
            Some(serde_json::json!({
                "email": email,
                "password": password,
                "name": email.split('@').next().unwrap(),
            })),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.request(
            Method::POST,
            "/api/auth/login",
            None,
            None,
            Some(serde_json::json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Registers and logs in, returning the access token
    pub async fn sign_up(&self, email: &str) -> String {
        let registered = self.register(email, "password123").await;
        assert_eq!(registered.status, StatusCode::CREATED, "{}", registered.body);

        let login = self.login(email, "password123").await;
        assert_eq!(login.status, StatusCode::OK, "{}", login.body);
        login.body["accessToken"].as_str().unwrap().to_string()
    }

    pub async fn create_task(&self, token: &str, title: &str, description: &str) -> Value {
        let response = self
            .request(
                Method::POST,
                "/api/tasks",
                Some(token),
                None,
                Some(serde_json::json!({ "title": title, "description": description })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body
    }
}

/// `name=value` from a `Set-Cookie` header, ready for a `Cookie` header
pub fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap().trim().to_string()
}
