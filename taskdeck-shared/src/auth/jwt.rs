/// Token service: access and refresh JWTs
///
/// Every session carries two HS256 tokens signed with *different* secrets:
///
/// - **Access token**: 15 minutes, claims `{id, email, name, role}`. Sent as a
///   bearer credential on every authenticated request.
/// - **Refresh token**: 7 days, claims `{id}`. Delivered as an http-only cookie
///   and only ever used to mint new access tokens.
///
/// Tokens are stateless. Nothing is persisted and there is no revocation list,
/// so a refresh token stays valid until it expires even after logout.
///
/// Verification checks signature, issuer and expiry with zero leeway. Whether
/// a token was absent or invalid is decided by the middleware, not here.
///
/// # Example
///
/// ```
/// use taskdeck_shared::auth::jwt::TokenKeys;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let keys = TokenKeys::new(
///     "access-secret-at-least-32-bytes-long!!",
///     "refresh-secret-at-least-32-bytes-long!",
/// );
///
/// let refresh = keys.issue_refresh_token(42)?;
/// assert_eq!(keys.verify_refresh_token(&refresh)?.id, 42);
///
/// // The access secret cannot verify a refresh token
/// assert!(keys.verify_access_token(&refresh).is_err());
/// # Ok(())
/// # }
/// ```

use std::fmt;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::models::user::{Role, UserProfile};

/// Issuer embedded in and required on every token
pub const ISSUER: &str = "taskdeck";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Token was not issued by this service
    #[error("Invalid token issuer")]
    InvalidIssuer,

    /// Signature, format, or claim set is invalid
    #[error("Invalid token: {0}")]
    Invalid(String),
}

/// Token type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    /// Short-lived bearer credential
    Access,

    /// Long-lived cookie credential
    Refresh,
}

impl TokenType {
    /// Default lifetime for this token type
    pub fn default_expiration(&self) -> Duration {
        match self {
            TokenType::Access => Duration::minutes(15),
            TokenType::Refresh => Duration::days(7),
        }
    }
}

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User ID
    pub id: i64,

    /// Email at the time of issue
    pub email: String,

    /// Display name at the time of issue
    pub name: String,

    /// Role at the time of issue
    pub role: Role,

    /// Issuer, always [`ISSUER`]
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl AccessClaims {
    /// Builds claims for `user` that expire after `expires_in`
    ///
    /// A negative duration produces already-expired claims, which is useful
    /// for exercising rejection paths.
    pub fn with_expiration(user: &UserProfile, expires_in: Duration) -> Self {
        let now = Utc::now();

        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
        }
    }

    /// Identity portion of the claims
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
        }
    }
}

/// Claims carried by a refresh token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// User ID
    pub id: i64,

    /// Issuer, always [`ISSUER`]
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl RefreshClaims {
    /// Builds claims for `user_id` that expire after `expires_in`
    pub fn with_expiration(user_id: i64, expires_in: Duration) -> Self {
        let now = Utc::now();

        Self {
            id: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
        }
    }
}

/// Signing material and lifetimes for both token types
#[derive(Clone)]
pub struct TokenKeys {
    access_secret: String,
    refresh_secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenKeys")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl TokenKeys {
    /// Creates keys with the default lifetimes (15 minutes / 7 days)
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_ttl: TokenType::Access.default_expiration(),
            refresh_ttl: TokenType::Refresh.default_expiration(),
        }
    }

    /// Overrides the token lifetimes
    pub fn with_lifetimes(mut self, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        self.access_ttl = access_ttl;
        self.refresh_ttl = refresh_ttl;
        self
    }

    /// Access token lifetime
    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Refresh token lifetime
    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Signs `{id, email, name, role}` with the access secret
    pub fn issue_access_token(&self, user: &UserProfile) -> Result<String, JwtError> {
        let claims = AccessClaims::with_expiration(user, self.access_ttl);
        create_token(&claims, &self.access_secret)
    }

    /// Signs `{id}` with the refresh secret
    pub fn issue_refresh_token(&self, user_id: i64) -> Result<String, JwtError> {
        let claims = RefreshClaims::with_expiration(user_id, self.refresh_ttl);
        create_token(&claims, &self.refresh_secret)
    }

    /// Verifies a bearer token against the access secret
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, JwtError> {
        verify(token, &self.access_secret)
    }

    /// Verifies a cookie token against the refresh secret
    pub fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims, JwtError> {
        verify(token, &self.refresh_secret)
    }
}

/// Signs any claim set with HS256
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails
pub fn create_token<T: Serialize>(claims: &T, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Verifies signature, issuer and expiry, then decodes the claims
///
/// Expiry is checked with zero leeway: a token is rejected the second its
/// `exp` passes.
///
/// # Errors
///
/// - `JwtError::Expired` if `exp` is in the past
/// - `JwtError::InvalidIssuer` if `iss` is not [`ISSUER`]
/// - `JwtError::Invalid` for bad signatures, malformed tokens, or claim sets
///   that do not match `T`
pub fn verify<T: DeserializeOwned>(token: &str, secret: &str) -> Result<T, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.leeway = 0;

    let token_data = decode::<T>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
        _ => JwtError::Invalid(e.to_string()),
    })?;

    Ok(token_data.claims)
}
