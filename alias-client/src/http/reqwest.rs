// alias-client/src/http/reqwest.rs
use super::{HttpClient, HttpError};
use async_trait::async_trait;
use std::time::Duration;

/// Header SimpleLogin reads the API key from.
const API_KEY_HEADER: &str = "Authentication";

#[cfg(feature = "reqwest")]
pub struct ReqwestClient {
    inner: reqwest::Client,
    api_key: Option<String>,
}

#[cfg(feature = "reqwest")]
impl ReqwestClient {
    pub fn new() -> Self {
        Self {
            inner: reqwest::Client::new(),
            api_key: None,
        }
    }

    /// Build a client whose requests fail with a transport error after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        let inner = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HttpError::transport(e.to_string()))?;
        Ok(Self {
            inner,
            api_key: None,
        })
    }

    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.api_key = Some(api_key);
        self
    }

    async fn execute(&self, mut req: reqwest::RequestBuilder) -> Result<Vec<u8>, HttpError> {
        if let Some(key) = &self.api_key {
            req = req.header(API_KEY_HEADER, key);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| HttpError::transport(e.to_string()))?;

        let status = resp.status();
        let is_success = status.is_success();
        let status_code = status.as_u16();

        // The timeout also covers the body, so a stalled read is a transport failure
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| HttpError::transport(e.to_string()))?
            .to_vec();

        if !is_success {
            return Err(HttpError::status(
                status_code,
                String::from_utf8_lossy(&bytes).to_string(),
            ));
        }

        Ok(bytes)
    }
}

#[cfg(feature = "reqwest")]
impl Default for ReqwestClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "reqwest")]
#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        self.execute(self.inner.get(url)).await
    }

    async fn post_json(&self, url: &str, body: Vec<u8>) -> Result<Vec<u8>, HttpError> {
        let req = self
            .inner
            .post(url)
            .header("content-type", "application/json")
            .body(body);
        self.execute(req).await
    }

    async fn delete(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        self.execute(self.inner.delete(url)).await
    }
}
