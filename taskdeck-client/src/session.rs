/// Client session controller
///
/// Holds the access token and user in memory and keeps them fresh using the
/// server's HttpOnly refresh cookie, which lives in the HTTP client's cookie
/// store and is never visible here.
///
/// # States
///
/// ```text
///            initialize()
/// Loading ──────────────┬──────────────► Authenticated
///                       └──────────────► Unauthenticated
///
/// Authenticated ── 401/403 ──► Refreshing ──ok──► Authenticated
///                                   └──fail──► Unauthenticated (forced logout)
/// ```
///
/// # Retry policy
///
/// [`SessionController::send_authenticated`] retries at most once. A request
/// rejected with 401 or 403 triggers one silent refresh and one retry. If the
/// retry is still rejected (for example by the admin gate) the response is
/// returned as is and the session stays authenticated. Only a failed refresh
/// ends the session.
///
/// # Single-flight refresh
///
/// Every state change that replaces the token bumps a generation counter.
/// A caller records the generation alongside the token it used; when it needs
/// a refresh it takes the refresh lock and, if the generation has moved on,
/// reuses the outcome instead of refreshing again. A login or logout that
/// lands while a refresh is in flight wins; the refresh result is dropped.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::error::{from_response, ClientError};
use crate::types::{AuthResponse, User};

/// Per-request timeout for the default HTTP client
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the session currently stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Before the first silent refresh finishes
    Loading,

    Unauthenticated,

    /// A silent refresh is in flight
    Refreshing,

    Authenticated { user: User, access_token: String },
}

#[derive(Debug)]
struct Inner {
    state: SessionState,
    generation: u64,
}

/// Session state machine over a cookie-enabled HTTP client
#[derive(Debug)]
pub struct SessionController {
    http: reqwest::Client,
    base_url: String,
    inner: RwLock<Inner>,
    refresh_lock: Mutex<()>,
}

impl SessionController {
    /// Creates a controller with its own cookie-enabled client
    ///
    /// `base_url` is the server origin, e.g. `http://localhost:8080`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self::with_client(base_url, http))
    }

    /// Uses an existing client; it must have a cookie store for refresh to work
    pub fn with_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            inner: RwLock::new(Inner {
                state: SessionState::Loading,
                generation: 0,
            }),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Starts a request against the server; no credentials attached
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    pub async fn state(&self) -> SessionState {
        self.inner.read().await.state.clone()
    }

    pub async fn user(&self) -> Option<User> {
        match &self.inner.read().await.state {
            SessionState::Authenticated { user, .. } => Some(user.clone()),
            _ => None,
        }
    }

    pub async fn is_authenticated(&self) -> bool {
        matches!(
            self.inner.read().await.state,
            SessionState::Authenticated { .. }
        )
    }

    /// Replaces the state and starts a new generation
    async fn set_state(&self, state: SessionState) {
        let mut inner = self.inner.write().await;
        inner.generation += 1;
        inner.state = state;
    }

    /// Current token (if any) and the generation it belongs to
    async fn snapshot(&self) -> (Option<String>, u64) {
        let inner = self.inner.read().await;
        let token = match &inner.state {
            SessionState::Authenticated { access_token, .. } => Some(access_token.clone()),
            _ => None,
        };
        (token, inner.generation)
    }

    /// Attempts a silent refresh so a returning user skips the login form
    pub async fn initialize(&self) -> SessionState {
        let (_, generation) = self.snapshot().await;
        match self.refresh_after(generation).await {
            Ok(_) => debug!("Session restored"),
            Err(e) => debug!(error = %e, "No session to restore"),
        }
        self.state().await
    }

    /// Logs in with credentials
    ///
    /// On failure the current state is left untouched.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ClientError> {
        let response = self
            .request(Method::POST, "/api/auth/login")
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(from_response(response).await);
        }

        let auth: AuthResponse = response.json().await?;
        let user = auth.user.clone();
        self.apply_login(auth).await;
        Ok(user)
    }

    /// Sets the session from an already obtained login response
    pub async fn apply_login(&self, auth: AuthResponse) {
        info!(user_id = auth.user.id, "Logged in");
        self.set_state(SessionState::Authenticated {
            user: auth.user,
            access_token: auth.access_token,
        })
        .await;
    }

    /// Asks the server to clear the refresh cookie, then clears local state
    ///
    /// Local state is cleared even when the server cannot be reached.
    pub async fn logout(&self) {
        match self.request(Method::POST, "/api/auth/logout").send().await {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => warn!(status = %response.status(), "Logout rejected by server"),
            Err(e) => warn!(error = %e, "Logout request failed"),
        }

        self.set_state(SessionState::Unauthenticated).await;
        info!("Logged out");
    }

    /// Silent refresh, shared with any refresh already in flight
    pub async fn refresh(&self) -> Result<String, ClientError> {
        let (_, generation) = self.snapshot().await;
        self.refresh_after(generation).await
    }

    /// Refreshes unless the session moved past `seen` while waiting for the lock
    ///
    /// Errors from the refresh request itself are returned as is, and only to
    /// the caller that sent it. A caller that finds the session already
    /// ended, or whose result is dropped because a login or logout happened
    /// while the request was in flight, gets `SessionExpired`.
    async fn refresh_after(&self, seen: u64) -> Result<String, ClientError> {
        let _guard = self.refresh_lock.lock().await;

        let started = {
            let mut inner = self.inner.write().await;
            if inner.generation != seen {
                return current_token(&inner.state);
            }
            inner.state = SessionState::Refreshing;
            inner.generation
        };

        let result = self.post_refresh().await;

        let mut inner = self.inner.write().await;
        if inner.generation != started || inner.state != SessionState::Refreshing {
            debug!("Session changed during refresh, result dropped");
            return current_token(&inner.state);
        }

        inner.generation += 1;
        match result {
            Ok(auth) => {
                debug!(user_id = auth.user.id, "Access token refreshed");
                let token = auth.access_token.clone();
                inner.state = SessionState::Authenticated {
                    user: auth.user,
                    access_token: auth.access_token,
                };
                Ok(token)
            }
            Err(e) => {
                debug!(error = %e, "Refresh failed");
                inner.state = SessionState::Unauthenticated;
                Err(e)
            }
        }
    }

    async fn post_refresh(&self) -> Result<AuthResponse, ClientError> {
        let response = self.request(Method::POST, "/api/auth/refresh").send().await?;

        if !response.status().is_success() {
            return Err(from_response(response).await);
        }

        Ok(response.json().await?)
    }

    /// Sends `request` with the current bearer token
    ///
    /// On 401 or 403, performs one silent refresh and retries once with the
    /// new token. If the refresh fails the session is logged out and the
    /// original response is returned. Requests whose body cannot be cloned
    /// are not retried.
    pub async fn send_authenticated(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let retry = request.try_clone();
        let (token, generation) = self.snapshot().await;

        let response = with_bearer(request, token.as_deref()).send().await?;

        if !is_auth_failure(response.status()) {
            return Ok(response);
        }
        let Some(retry) = retry else {
            return Ok(response);
        };

        match self.refresh_after(generation).await {
            Ok(token) => Ok(with_bearer(retry, Some(&token)).send().await?),
            // Ended elsewhere; whoever ended it already logged out
            Err(ClientError::SessionExpired) => Ok(response),
            Err(e) => {
                warn!(status = %response.status(), error = %e, "Session could not be refreshed");
                self.logout().await;
                Ok(response)
            }
        }
    }
}

fn current_token(state: &SessionState) -> Result<String, ClientError> {
    match state {
        SessionState::Authenticated { access_token, .. } => Ok(access_token.clone()),
        _ => Err(ClientError::SessionExpired),
    }
}

fn with_bearer(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}

fn is_auth_failure(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}
