/// Configuration management for the API server
///
/// Configuration is read from environment variables; a `.env` file is loaded
/// first when present.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_ACCESS_SECRET`: Access token signing secret (required, 32+ chars)
/// - `JWT_REFRESH_SECRET`: Refresh token signing secret (required, 32+ chars,
///   different from the access secret)
/// - `ACCESS_TOKEN_TTL_SECONDS`: Access token lifetime (default: 900)
/// - `REFRESH_TOKEN_TTL_SECONDS`: Refresh token lifetime (default: 604800)
///
/// Lifetimes must lie in `1..=MAX_TTL_SECONDS`.
/// - `CORS_ORIGINS`: Comma-separated allowed origins, `*` for any (default: *)
/// - `COOKIE_SECURE`: Mark the refresh cookie `Secure` (default: true)
/// - `PRODUCTION`: Enables HSTS (default: false)
/// - `RUST_LOG`: Log filter (default: taskdeck_api=debug,tower_http=debug)
/// - `LOG_FORMAT`: `json` for JSON log lines
///
/// # Example
///
/// ```no_run
/// use taskdeck_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::env;
use std::str::FromStr;

use anyhow::Context;
use chrono::Duration;
use taskdeck_shared::auth::jwt::TokenKeys;
use taskdeck_shared::db::pool::DatabaseConfig as PoolConfig;

/// Shortest accepted signing secret
pub const MIN_SECRET_LEN: usize = 32;

/// Longest accepted token lifetime (one year)
pub const MAX_TTL_SECONDS: i64 = 365 * 24 * 60 * 60;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `["*"]` allows any
    pub cors_origins: Vec<String>,

    /// Whether the refresh cookie carries the `Secure` attribute
    pub cookie_secure: bool,

    /// Production mode adds HSTS
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Token signing configuration
#[derive(Clone)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl_seconds: i64,
    pub refresh_ttl_seconds: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("access_ttl_seconds", &self.access_ttl_seconds)
            .field("refresh_ttl_seconds", &self.refresh_ttl_seconds)
            .finish()
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", key, raw)),
        None => Ok(default),
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<String> {
    lookup(key)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow::anyhow!("{} environment variable is required", key))
}

impl Config {
    /// Loads configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing, a value does not
    /// parse, or the signing secrets are too short or identical
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let host = lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(&lookup, "API_PORT", 8080u16)?;

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let database_url = required(&lookup, "DATABASE_URL")?;
        let max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10u32)?;

        let access_secret = required(&lookup, "JWT_ACCESS_SECRET")?;
        let refresh_secret = required(&lookup, "JWT_REFRESH_SECRET")?;

        if access_secret.len() < MIN_SECRET_LEN {
            anyhow::bail!("JWT_ACCESS_SECRET must be at least {} characters long", MIN_SECRET_LEN);
        }
        if refresh_secret.len() < MIN_SECRET_LEN {
            anyhow::bail!("JWT_REFRESH_SECRET must be at least {} characters long", MIN_SECRET_LEN);
        }
        if access_secret == refresh_secret {
            anyhow::bail!("JWT_ACCESS_SECRET and JWT_REFRESH_SECRET must differ");
        }

        let access_ttl_seconds = parse_or(&lookup, "ACCESS_TOKEN_TTL_SECONDS", 900i64)?;
        let refresh_ttl_seconds = parse_or(&lookup, "REFRESH_TOKEN_TTL_SECONDS", 604_800i64)?;

        if access_ttl_seconds <= 0 || refresh_ttl_seconds <= 0 {
            anyhow::bail!("Token lifetimes must be positive");
        }
        if access_ttl_seconds > MAX_TTL_SECONDS || refresh_ttl_seconds > MAX_TTL_SECONDS {
            anyhow::bail!("Token lifetimes must be at most {} seconds", MAX_TTL_SECONDS);
        }

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
                cookie_secure: parse_or(&lookup, "COOKIE_SECURE", true)?,
                production: parse_or(&lookup, "PRODUCTION", false)?,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig {
                access_secret,
                refresh_secret,
                access_ttl_seconds,
                refresh_ttl_seconds,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Whether CORS should accept any origin
    pub fn cors_allows_any(&self) -> bool {
        self.api.cors_origins.iter().any(|origin| origin == "*")
    }

    /// Signing keys and lifetimes for the token service
    pub fn token_keys(&self) -> TokenKeys {
        TokenKeys::new(&self.jwt.access_secret, &self.jwt.refresh_secret).with_lifetimes(
            Duration::seconds(self.jwt.access_ttl_seconds),
            Duration::seconds(self.jwt.refresh_ttl_seconds),
        )
    }

    /// Pool settings derived from this configuration
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            url: self.database.url.clone(),
            max_connections: self.database.max_connections,
            ..Default::default()
        }
    }
}
