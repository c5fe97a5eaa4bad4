/// Session middleware and admin gate for Axum
///
/// [`require_session`] reads `Authorization: Bearer <token>`, verifies it as an
/// access token, and inserts an [`AuthUser`] into the request extensions.
/// [`require_admin`] runs after it and lets only `admin` users through.
///
/// Identity comes from the token alone; there is no database lookup here, so
/// a deleted user's access token keeps working until it expires.
///
/// # Errors
///
/// | Case | Status | Message |
/// |------|--------|---------|
/// | no bearer token | 401 | Access token required |
/// | bad signature, wrong secret, expired | 403 | Invalid or expired token |
/// | not admin, or no identity at the admin gate | 403 | Admin access required |
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Extension, Router};
/// use taskdeck_shared::auth::jwt::TokenKeys;
/// use taskdeck_shared::auth::middleware::{require_admin, require_session, AuthUser};
///
/// async fn whoami(Extension(user): Extension<AuthUser>) -> String {
///     format!("{} ({})", user.email, user.role)
/// }
///
/// let keys = TokenKeys::new(
///     "access-secret-at-least-32-bytes-long!!",
///     "refresh-secret-at-least-32-bytes-long!",
/// );
///
/// let app: Router = Router::new()
///     .route("/admin/whoami", get(whoami))
///     .route_layer(middleware::from_fn(require_admin))
///     .route_layer(middleware::from_fn_with_state(keys, require_session));
/// ```

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::jwt::{AccessClaims, TokenKeys};
use crate::models::user::{Role, UserProfile};

/// Identity of the caller, taken from a verified access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
        }
    }
}

impl From<AccessClaims> for AuthUser {
    fn from(claims: AccessClaims) -> Self {
        Self {
            id: claims.id,
            email: claims.email,
            name: claims.name,
            role: claims.role,
        }
    }
}

/// Rejection produced by the session middleware and admin gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// No bearer token on the request
    MissingToken,

    /// Token failed verification
    InvalidToken,

    /// Authenticated, but not an admin
    AdminRequired,
}

impl AuthError {
    fn parts(&self) -> (StatusCode, &'static str, &'static str) {
        match self {
            AuthError::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Access token required",
            ),
            AuthError::InvalidToken => (
                StatusCode::FORBIDDEN,
                "forbidden",
                "Invalid or expired token",
            ),
            AuthError::AdminRequired => (
                StatusCode::FORBIDDEN,
                "forbidden",
                "Admin access required",
            ),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error, message) = self.parts();
        (status, Json(json!({ "error": error, "message": message }))).into_response()
    }
}

/// Pulls the token out of `Authorization: Bearer <token>`
///
/// Any other scheme, or an empty token, counts as no token.
fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Verifies the access token and attaches [`AuthUser`] to the request
pub async fn require_session(
    State(keys): State<TokenKeys>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(&req).ok_or(AuthError::MissingToken)?;

    let claims = keys.verify_access_token(token).map_err(|e| {
        debug!(error = %e, "Rejected access token");
        AuthError::InvalidToken
    })?;

    req.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(req).await)
}

/// Lets the request through only for admins
///
/// Must run after [`require_session`]; a request without an [`AuthUser`] is
/// rejected the same way as a non-admin.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AuthError> {
    let user = req
        .extensions()
        .get::<AuthUser>()
        .ok_or(AuthError::AdminRequired)?;

    if !user.is_admin() {
        debug!(user_id = user.id, "Admin access denied");
        return Err(AuthError::AdminRequired);
    }

    Ok(next.run(req).await)
}
