/// System-wide counts shown on the admin dashboard

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Totals across all users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub users: i64,
    pub tasks: i64,
    pub completed_tasks: i64,
}

impl AdminStats {
    /// Reads all three counts in one statement
    pub async fn collect(pool: &PgPool) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, AdminStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS users,
                (SELECT COUNT(*) FROM tasks) AS tasks,
                (SELECT COUNT(*) FROM tasks WHERE status = 'completed') AS completed_tasks
            "#,
        )
        .fetch_one(pool)
        .await
    }
}
