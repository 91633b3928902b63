// alias-client/src/http/mod.rs
use async_trait::async_trait;

/// Error from HTTP request
#[derive(Debug, Clone)]
pub struct HttpError {
    /// Response status, `None` when no response arrived (connect failure, timeout)
    pub status: Option<u16>,
    pub message: String,
}

impl HttpError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(status) = self.status {
            write!(f, "HTTP error {}: {}", status, self.message)
        } else {
            write!(f, "HTTP error: {}", self.message)
        }
    }
}

impl std::error::Error for HttpError {}

/// Generic HTTP client trait - users can implement their own
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// GET the URL, return response bytes
    async fn get(&self, url: &str) -> Result<Vec<u8>, HttpError>;

    /// POST JSON data to URL, return response bytes
    async fn post_json(&self, url: &str, body: Vec<u8>) -> Result<Vec<u8>, HttpError>;

    /// DELETE the URL, return response bytes
    async fn delete(&self, url: &str) -> Result<Vec<u8>, HttpError>;
}

#[cfg(feature = "reqwest")]
pub mod reqwest;

#[cfg(feature = "reqwest")]
pub use reqwest::ReqwestClient;
