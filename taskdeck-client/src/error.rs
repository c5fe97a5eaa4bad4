/// Client error type
///
/// Network failures are kept apart from errors the server reported, so
/// callers can offer "try again" for the first and show the message for the
/// second.

use reqwest::StatusCode;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request never got a response
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with an error status
    #[error("{message} ({status})")]
    Api { status: StatusCode, message: String },

    /// Silent refresh failed; the user must log in again
    #[error("Session expired")]
    SessionExpired,

    /// The response body was not what we expected
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl ClientError {
    /// Whether retrying the same request later might succeed
    pub fn is_network(&self) -> bool {
        matches!(self, ClientError::Network(_))
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// Builds an `Api` error from a non-success response
pub(crate) async fn from_response(response: reqwest::Response) -> ClientError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    let message = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|body| body.message.or(body.error))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });

    ClientError::Api { status, message }
}
