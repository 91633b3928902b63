// alias-client/src/error.rs
use crate::http::HttpError;
use serde::Serialize;
use thiserror::Error;

/// Failure reported by an [`AliasApi`](crate::AliasApi) call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// No response arrived (connection failure, timeout). Retryable by the user.
    #[error("network error: {0}")]
    Network(String),

    /// Missing or rejected API key.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The alias does not exist on the server.
    #[error("alias not found: {0}")]
    NotFound(String),

    /// Any other server-side failure; message is surfaced verbatim.
    #[error("{0}")]
    Server(String),

    /// The server answered with a body we could not decode.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Coarse classification of [`ApiError`] used by observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Network,
    Auth,
    NotFound,
    Server,
}

impl ErrorKind {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Network => "network_error",
            Self::Auth => "auth_error",
            Self::NotFound => "not_found",
            Self::Server => "server_error",
        };
        f.write_str(name)
    }
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::Network,
            Self::Auth(_) => ErrorKind::Auth,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Server(_) | Self::InvalidResponse(_) => ErrorKind::Server,
        }
    }

    /// Message suitable for showing to the end user.
    pub fn human_message(&self) -> String {
        match self {
            Self::Network(_) => {
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            Self::Auth(_) => "Your API key is missing or invalid. Please sign in again.".to_string(),
            Self::NotFound(_) => "This alias no longer exists.".to_string(),
            Self::Server(message) => message.clone(),
            Self::InvalidResponse(message) => format!("Unexpected server response: {}", message),
        }
    }
}

impl From<HttpError> for ApiError {
    fn from(err: HttpError) -> Self {
        match err.status {
            None => Self::Network(err.message),
            Some(401) | Some(403) => Self::Auth(err.message),
            Some(404) => Self::NotFound(err.message),
            Some(status) => Self::Server(server_message(status, &err.message)),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

/// SimpleLogin puts the reason in `{"error": "..."}`; fall back to the raw body.
fn server_message(status: u16, body: &str) -> String {
    let reason = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from));
    match reason {
        Some(reason) => reason,
        None if body.trim().is_empty() => format!("server returned status {}", status),
        None => body.to_string(),
    }
}
