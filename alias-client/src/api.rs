// alias-client/src/api.rs
use crate::error::ApiError;
use crate::types::{AliasId, AliasPage, Cursor};
use async_trait::async_trait;

/// Remote operations the sync engine depends on.
///
/// Implementations own timeouts and transport concerns; every failure is
/// reported as an [`ApiError`].
#[async_trait]
pub trait AliasApi: Send + Sync {
    /// List the page of aliases starting at `cursor`.
    async fn list_aliases(&self, cursor: &Cursor) -> Result<AliasPage, ApiError>;

    /// Ask the server to set `enabled` on an alias, returning the value it confirmed.
    async fn set_alias_enabled(&self, id: AliasId, desired: bool) -> Result<bool, ApiError>;

    /// Delete an alias permanently.
    async fn delete_alias(&self, id: AliasId) -> Result<(), ApiError>;
}
