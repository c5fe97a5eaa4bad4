/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: Access/refresh token issuing and verification
/// - [`middleware`]: Session middleware and admin gate for Axum
///
/// # Example
///
/// ```
/// use taskdeck_shared::auth::jwt::TokenKeys;
/// use taskdeck_shared::models::user::{Role, UserProfile};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let keys = TokenKeys::new(
///     "access-secret-at-least-32-bytes-long!!",
///     "refresh-secret-at-least-32-bytes-long!",
/// );
///
/// let user = UserProfile {
///     id: 1,
///     email: "ada@example.com".to_string(),
///     name: "Ada".to_string(),
///     role: Role::Admin,
/// };
///
/// let access = keys.issue_access_token(&user)?;
/// let claims = keys.verify_access_token(&access)?;
/// assert_eq!(claims.id, 1);
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;
