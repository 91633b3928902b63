// alias-client/src/client.rs
use crate::api::AliasApi;
use crate::error::ApiError;
use crate::http::HttpClient;
use crate::types::{AliasId, AliasListResponse, AliasPage, Cursor, ToggleResponse};
use async_trait::async_trait;

/// Number of aliases SimpleLogin returns per page.
pub const PAGE_SIZE: usize = 20;

pub struct AliasClient<C: HttpClient> {
    http: C,
    base_url: String,
}

impl<C: HttpClient> AliasClient<C> {
    pub fn new(http: C, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// SimpleLogin paginates by page number; the start cursor is page 0.
    fn page_id(cursor: &Cursor) -> Result<u32, ApiError> {
        match cursor.token() {
            None => Ok(0),
            Some(token) => token
                .parse()
                .map_err(|_| ApiError::InvalidResponse(format!("bad page cursor: {}", token))),
        }
    }
}

#[async_trait]
impl<C: HttpClient> AliasApi for AliasClient<C> {
    async fn list_aliases(&self, cursor: &Cursor) -> Result<AliasPage, ApiError> {
        let page_id = Self::page_id(cursor)?;
        let url = self.url(&format!("/api/v2/aliases?page_id={}", page_id));

        let resp_bytes = self.http.get(&url).await?;
        let resp: AliasListResponse = serde_json::from_slice(&resp_bytes)?;

        // A short page is the last one
        let has_more = resp.aliases.len() >= PAGE_SIZE;

        Ok(AliasPage {
            aliases: resp.aliases,
            next_cursor: Cursor::from_token((page_id + 1).to_string()),
            has_more,
        })
    }

    async fn set_alias_enabled(&self, id: AliasId, _desired: bool) -> Result<bool, ApiError> {
        // The endpoint flips whatever the server holds, so the confirmed value
        // can differ from `desired` when another client changed it meanwhile.
        let url = self.url(&format!("/api/aliases/{}/toggle", id));
        let resp_bytes = self.http.post_json(&url, b"{}".to_vec()).await?;
        let resp: ToggleResponse = serde_json::from_slice(&resp_bytes)?;
        Ok(resp.enabled)
    }

    async fn delete_alias(&self, id: AliasId) -> Result<(), ApiError> {
        let url = self.url(&format!("/api/aliases/{}", id));
        self.http.delete(&url).await?;
        Ok(())
    }
}
