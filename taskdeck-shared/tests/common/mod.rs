/// Shared setup for database-backed tests
///
/// Each test gets its own PostgreSQL schema with migrations applied, so tests
/// can run in parallel and the first-admin rule always starts from an empty
/// users table. Tests are skipped when `DATABASE_URL` is not set.

use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use taskdeck_shared::models::user::{CreateUser, User};

static SCHEMA_COUNTER: AtomicU32 = AtomicU32::new(0);

pub struct TestDb {
    pub pool: PgPool,
    admin: PgPool,
    schema: String,
}

impl TestDb {
    /// Fresh, migrated schema, or `None` without a database
    pub async fn new() -> Option<Self> {
        let url = std::env::var("DATABASE_URL").ok()?;

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .subsec_nanos();
        let schema = format!(
            "test_{}_{}_{}",
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
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .expect("connect to test schema");

        taskdeck_shared::db::migrations::run_migrations(&pool)
            .await
            .expect("run migrations");

        Some(Self {
            pool,
            admin,
            schema,
        })
    }

    pub async fn cleanup(self) {
        self.pool.close().await;
        sqlx::query(&format!("DROP SCHEMA {} CASCADE", self.schema))
            .execute(&self.admin)
            .await
            .expect("drop test schema");
    }
}

/// Registers a user with a placeholder hash
pub async fn create_user(pool: &PgPool, email: &str) -> User {
    User::create(
        pool,
        CreateUser {
            email: email.to_string(),
            password_hash: "$argon2id$placeholder".to_string(),
            name: email.split('@').next().unwrap_or(email).to_string(),
        },
    )
    .await
    .expect("create user")
}
