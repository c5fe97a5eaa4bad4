/// Database models for TaskDeck
///
/// # Models
///
/// - `user`: accounts, roles, and the first-admin rule
/// - `task`: tasks and owner-scoped mutations
/// - `task_query`: filtered, paginated task listing
/// - `stats`: system-wide counts for the admin dashboard
///
/// # Example
///
/// ```no_run
/// use taskdeck_shared::models::user::{User, CreateUser};
/// use taskdeck_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let new_user = CreateUser {
///     email: "user@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     name: "Jo Doe".to_string(),
/// };
///
/// let user = User::create(&pool, new_user).await?;
/// # Ok(())
/// # }
/// ```

pub mod stats;
pub mod task;
pub mod task_query;
pub mod user;
