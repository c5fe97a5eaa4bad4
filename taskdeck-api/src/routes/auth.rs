/// Authentication endpoints
///
/// - `POST /api/auth/register`: create an account (first account is admin)
/// - `POST /api/auth/login`: verify credentials, issue an access token, and
///   set the refresh cookie
/// - `POST /api/auth/refresh`: trade the refresh cookie for a new access token
/// - `POST /api/auth/logout`: clear the refresh cookie
///
/// The refresh token never appears in a response body. It travels only in the
/// `refreshToken` cookie (HttpOnly, SameSite=None, Path=/), which is `Secure`
/// unless `COOKIE_SECURE=false`.
///
/// Refresh tokens are stateless: logout clears the browser's cookie but does
/// not invalidate a copy of the token held elsewhere.

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::{
    cookie::{Cookie, CookieJar, SameSite},
    WithRejection,
};
use serde::{Deserialize, Serialize};
use taskdeck_shared::{
    auth::password,
    models::user::{CreateUser, Role, User, UserProfile},
};
use tracing::{info, warn};
use validator::Validate;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

/// Name of the refresh cookie
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Register request; all three fields are required
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(max = 128, message = "Password must be at most 128 characters"))]
    pub password: Option<String>,

    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,
}

/// Register response
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: i64,
    pub message: &'static str,
    pub role: Role,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Body returned by login and refresh
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub user: UserProfile,
}

/// Logout response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Runs password hashing off the async runtime
async fn blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> Result<T, password::PasswordError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::InternalError(format!("Password task failed: {}", e)))?
        .map_err(ApiError::from)
}

fn refresh_cookie(state: &AppState, token: String) -> Cookie<'static> {
    let max_age = time::Duration::seconds(state.tokens.refresh_ttl().num_seconds());

    Cookie::build((REFRESH_COOKIE, token))
        .http_only(true)
        .secure(state.config.api.cookie_secure)
        .same_site(SameSite::None)
        .path("/")
        .max_age(max_age)
        .build()
}

/// Register a new user
///
/// ```text
/// POST /api/auth/register
///
/// { "email": "ada@example.com", "password": "hunter2", "name": "Ada" }
/// ```
///
/// Responds `201 {"id": 1, "message": "User registered", "role": "admin"}`.
///
/// # Errors
///
/// - `400`: a field is missing, the email is malformed, or the email exists
pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<RegisterRequest>, ApiError>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    req.validate()?;

    let (Some(email), Some(password), Some(name)) = (
        non_empty(req.email),
        non_empty(req.password),
        non_empty(req.name),
    ) else {
        return Err(ApiError::BadRequest("Missing fields".to_string()));
    };

    let password_hash = blocking(move || password::hash_password(&password)).await?;

    let user = User::create(
        &state.db,
        CreateUser {
            email,
            password_hash,
            name,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id,
            message: "User registered",
            role: user.role,
        }),
    ))
}

/// Log in with email and password
///
/// Sets the refresh cookie and returns `{"accessToken", "user"}`.
///
/// # Errors
///
/// - `400`: email or password missing
/// - `401`: unknown email or wrong password (indistinguishable)
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> ApiResult<(CookieJar, Json<AuthResponse>)> {
    let (Some(email), Some(password)) = (non_empty(req.email), req.password) else {
        return Err(ApiError::BadRequest("Missing fields".to_string()));
    };

    let invalid = || ApiError::Unauthorized("Invalid credentials".to_string());

    let Some(user) = User::find_by_email(&state.db, &email).await? else {
        // Same cost as a real check so timing does not reveal registered emails
        tokio::task::spawn_blocking(move || password::dummy_verify(&password))
            .await
            .ok();
        warn!("Login failed: unknown email");
        return Err(invalid());
    };

    let hash = user.password_hash.clone();
    if !blocking(move || password::verify_password(&password, &hash)).await? {
        warn!(user_id = user.id, "Login failed: wrong password");
        return Err(invalid());
    }

    let profile = user.profile();
    let access_token = state.tokens.issue_access_token(&profile)?;
    let refresh_token = state.tokens.issue_refresh_token(user.id)?;

    info!(user_id = user.id, role = %user.role, "User logged in");

    Ok((
        jar.add(refresh_cookie(&state, refresh_token)),
        Json(AuthResponse {
            access_token,
            user: profile,
        }),
    ))
}

/// Issue a new access token from the refresh cookie
///
/// Claims come from the stored user, so a role change since login is picked
/// up here.
///
/// # Errors
///
/// - `403`: cookie missing, invalid, expired, or the user no longer exists
pub async fn refresh(State(state): State<AppState>, jar: CookieJar) -> ApiResult<Json<AuthResponse>> {
    let token = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::Forbidden("Refresh token required".to_string()))?;

    let claims = state
        .tokens
        .verify_refresh_token(&token)
        .map_err(|_| ApiError::Forbidden("Invalid refresh token".to_string()))?;

    let user = User::find_by_id(&state.db, claims.id)
        .await?
        .ok_or_else(|| ApiError::Forbidden("User not found".to_string()))?;

    let profile = user.profile();
    let access_token = state.tokens.issue_access_token(&profile)?;

    Ok(Json(AuthResponse {
        access_token,
        user: profile,
    }))
}

/// Clear the refresh cookie
///
/// Always succeeds, with or without a cookie on the request.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    let removal = Cookie::build((REFRESH_COOKIE, ""))
        .http_only(true)
        .secure(state.config.api.cookie_secure)
        .same_site(SameSite::None)
        .path("/")
        .max_age(time::Duration::ZERO)
        .build();

    (
        jar.add(removal),
        Json(MessageResponse {
            message: "Logged out",
        }),
    )
}
