/// Integration tests for the TaskDeck API
///
/// These drive the full router against PostgreSQL:
/// - registration, login, refresh, logout
/// - owner-scoped task listing and mutations
/// - admin statistics and user deletion
///
/// Set DATABASE_URL to run; without it each test returns early.

mod common;

use axum::http::{Method, StatusCode};
use common::{cookie_pair, TestContext, ACCESS_SECRET};
use serde_json::json;
use taskdeck_shared::auth::jwt::{create_token, AccessClaims};
use taskdeck_shared::models::user::{Role, UserProfile};

#[tokio::test]
async fn test_first_registration_is_admin() {
    let Some(ctx) = TestContext::new().await else { return };

    let first = ctx.register("first@example.com", "pw-one").await;
    assert_eq!(first.status, StatusCode::CREATED);
    assert_eq!(first.body["role"], "admin");
    assert_eq!(first.body["message"], "User registered");

    let second = ctx.register("second@example.com", "pw-two").await;
    assert_eq!(second.body["role"], "user");

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_duplicate_email_is_400() {
    let Some(ctx) = TestContext::new().await else { return };

    ctx.register("dup@example.com", "pw").await;
    let again = ctx.register("dup@example.com", "other").await;

    assert_eq!(again.status, StatusCode::BAD_REQUEST);
    assert_eq!(again.body["message"], "Email already exists");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&ctx.db)
        .await
        .unwrap();
    assert_eq!(count, 1);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_login_sets_refresh_cookie() {
    let Some(ctx) = TestContext::new().await else { return };

    ctx.register("ada@example.com", "correct horse").await;

    let wrong = ctx.login("ada@example.com", "battery staple").await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.body["message"], "Invalid credentials");

    let unknown = ctx.login("nobody@example.com", "correct horse").await;
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);

    let ok = ctx.login("ada@example.com", "correct horse").await;
    assert_eq!(ok.status, StatusCode::OK);
    assert!(ok.body["accessToken"].is_string());
    assert_eq!(ok.body["user"]["email"], "ada@example.com");
    assert!(ok.body["user"].get("password_hash").is_none());

    let cookie = ok.set_cookie.unwrap();
    assert!(cookie.starts_with("refreshToken="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=None"));
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Max-Age=604800"));

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_refresh_flow() {
    let Some(ctx) = TestContext::new().await else { return };

    ctx.register("ref@example.com", "pw").await;
    let login = ctx.login("ref@example.com", "pw").await;
    let cookie = cookie_pair(&login.set_cookie.unwrap());

    let refreshed = ctx
        .request(Method::POST, "/api/auth/refresh", None, Some(&cookie), None)
        .await;
    assert_eq!(refreshed.status, StatusCode::OK);
    assert_eq!(refreshed.body["user"], login.body["user"]);

    // The new token is accepted by the session middleware
    let token = refreshed.body["accessToken"].as_str().unwrap();
    let tasks = ctx
        .request(Method::GET, "/api/tasks", Some(token), None, None)
        .await;
    assert_eq!(tasks.status, StatusCode::OK);

    let bogus = ctx
        .request(
            Method::POST,
            "/api/auth/refresh",
            None,
            Some("refreshToken=not-a-token"),
            None,
        )
        .await;
    assert_eq!(bogus.status, StatusCode::FORBIDDEN);

    // An access token is not a refresh token
    let swapped = ctx
        .request(
            Method::POST,
            "/api/auth/refresh",
            None,
            Some(&format!("refreshToken={}", token)),
            None,
        )
        .await;
    assert_eq!(swapped.status, StatusCode::FORBIDDEN);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_expired_vs_missing_token() {
    let Some(ctx) = TestContext::new().await else { return };

    let claims = AccessClaims::with_expiration(
        &UserProfile {
            id: 1,
            email: "old@example.com".to_string(),
            name: "Old".to_string(),
            role: Role::User,
        },
        chrono::Duration::seconds(-30),
    );
    let expired = create_token(&claims, ACCESS_SECRET).unwrap();

    let response = ctx
        .request(Method::GET, "/api/tasks", Some(&expired), None, None)
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = ctx
        .request(Method::GET, "/api/tasks", None, None, None)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_listing_is_owner_scoped() {
    let Some(ctx) = TestContext::new().await else { return };

    let alice = ctx.sign_up("alice@example.com").await;
    let bob = ctx.sign_up("bob@example.com").await;

    ctx.create_task(&alice, "Alice report", "").await;
    ctx.create_task(&bob, "Bob report", "").await;

    for uri in [
        "/api/tasks",
        "/api/tasks?search=report",
        "/api/tasks?status=todo&search=Bob",
        "/api/tasks?status=all",
    ] {
        let response = ctx.request(Method::GET, uri, Some(&alice), None, None).await;
        assert_eq!(response.status, StatusCode::OK);
        for task in response.body["tasks"].as_array().unwrap() {
            assert_eq!(task["title"], "Alice report", "{}", uri);
        }
    }

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_pagination_and_filters() {
    let Some(ctx) = TestContext::new().await else { return };

    let token = ctx.sign_up("pager@example.com").await;
    for i in 0..15 {
        ctx.create_task(&token, &format!("Task {}", i), "").await;
    }

    let page = ctx
        .request(Method::GET, "/api/tasks?page=2&limit=10", Some(&token), None, None)
        .await;
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.body["tasks"].as_array().unwrap().len(), 5);
    assert_eq!(page.body["total"], 15);
    assert_eq!(page.body["page"], 2);
    assert_eq!(page.body["totalPages"], 2);
    assert_eq!(page.body["tasks"][0]["title"], "Task 4");

    let first = page.body["tasks"][4]["id"].as_i64().unwrap();
    let toggled = ctx
        .request(
            Method::PATCH,
            &format!("/api/tasks/{}/toggle", first),
            Some(&token),
            None,
            None,
        )
        .await;
    assert_eq!(toggled.body["status"], "completed");

    let completed = ctx
        .request(Method::GET, "/api/tasks?status=completed", Some(&token), None, None)
        .await;
    assert_eq!(completed.body["total"], 1);
    assert_eq!(completed.body["tasks"][0]["id"], first);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_task_mutations() {
    let Some(ctx) = TestContext::new().await else { return };

    let token = ctx.sign_up("editor@example.com").await;
    let task = ctx.create_task(&token, "Draft", "v1").await;
    let id = task["id"].as_i64().unwrap();
    assert_eq!(task["status"], "todo");

    let updated = ctx
        .request(
            Method::PATCH,
            &format!("/api/tasks/{}", id),
            Some(&token),
            None,
            Some(json!({ "title": "", "description": "v2" })),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["title"], "Draft");
    assert_eq!(updated.body["description"], "v2");

    let uri = format!("/api/tasks/{}/toggle", id);
    let once = ctx.request(Method::PATCH, &uri, Some(&token), None, None).await;
    let twice = ctx.request(Method::PATCH, &uri, Some(&token), None, None).await;
    assert_eq!(once.body["status"], "completed");
    assert_eq!(twice.body["status"], "todo");

    let deleted = ctx
        .request(Method::DELETE, &format!("/api/tasks/{}", id), Some(&token), None, None)
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["message"], "Task deleted");

    let again = ctx
        .request(Method::DELETE, &format!("/api/tasks/{}", id), Some(&token), None, None)
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_foreign_task_is_404_and_unchanged() {
    let Some(ctx) = TestContext::new().await else { return };

    let owner = ctx.sign_up("owner@example.com").await;
    let intruder = ctx.sign_up("intruder@example.com").await;
    let task = ctx.create_task(&owner, "Mine", "").await;
    let id = task["id"].as_i64().unwrap();

    for (method, uri, body) in [
        (Method::PATCH, format!("/api/tasks/{}", id), Some(json!({ "title": "Yours" }))),
        (Method::PATCH, format!("/api/tasks/{}/toggle", id), None),
        (Method::DELETE, format!("/api/tasks/{}", id), None),
    ] {
        let response = ctx.request(method, &uri, Some(&intruder), None, body).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(response.body["message"], "Task not found");
    }

    let listing = ctx
        .request(Method::GET, "/api/tasks", Some(&owner), None, None)
        .await;
    assert_eq!(listing.body["tasks"][0], task);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_admin_endpoints() {
    let Some(ctx) = TestContext::new().await else { return };

    let admin = ctx.sign_up("admin@example.com").await;
    let user = ctx.sign_up("user@example.com").await;
    let done = ctx.create_task(&user, "Done", "").await;
    ctx.create_task(&user, "Open", "").await;
    ctx.request(
        Method::PATCH,
        &format!("/api/tasks/{}/toggle", done["id"]),
        Some(&user),
        None,
        None,
    )
    .await;

    let forbidden = ctx
        .request(Method::GET, "/api/admin/stats", Some(&user), None, None)
        .await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let stats = ctx
        .request(Method::GET, "/api/admin/stats", Some(&admin), None, None)
        .await;
    assert_eq!(stats.body, json!({ "users": 2, "tasks": 2, "completedTasks": 1 }));

    let users = ctx
        .request(Method::GET, "/api/admin/users", Some(&admin), None, None)
        .await;
    let list = users.body.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["role"], "admin");
    assert!(list[0].get("password_hash").is_none());
    let user_id = list[1]["id"].as_i64().unwrap();
    let admin_id = list[0]["id"].as_i64().unwrap();

    let self_delete = ctx
        .request(
            Method::DELETE,
            &format!("/api/admin/users/{}", admin_id),
            Some(&admin),
            None,
            None,
        )
        .await;
    assert_eq!(self_delete.status, StatusCode::BAD_REQUEST);

    let deleted = ctx
        .request(
            Method::DELETE,
            &format!("/api/admin/users/{}", user_id),
            Some(&admin),
            None,
            None,
        )
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["message"], "User and their tasks deleted");

    let stats = ctx
        .request(Method::GET, "/api/admin/stats", Some(&admin), None, None)
        .await;
    assert_eq!(stats.body, json!({ "users": 1, "tasks": 0, "completedTasks": 0 }));

    let missing = ctx
        .request(
            Method::DELETE,
            &format!("/api/admin/users/{}", user_id),
            Some(&admin),
            None,
            None,
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_health() {
    let Some(ctx) = TestContext::new().await else { return };

    let health = ctx.request(Method::GET, "/health", None, None, None).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body["status"], "healthy");
    assert_eq!(health.body["database"], "connected");

    ctx.cleanup().await;
}
