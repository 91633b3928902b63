// alias-sync/src/client.rs
use crate::config::Config;
use crate::engine::AliasListEngine;
use alias_client::{AliasClient, ReqwestClient};
use anyhow::{anyhow, Result};

/// Engine talking to the SimpleLogin REST API over reqwest
pub type SimpleLoginEngine = AliasListEngine<AliasClient<ReqwestClient>>;

/// Build an engine from the stored configuration.
pub fn connect(config: &Config) -> Result<SimpleLoginEngine> {
    let api_key = config.api_key()?.to_string();
    let http = ReqwestClient::with_timeout(config.timeout())
        .map_err(|e| anyhow!("Failed to build HTTP client: {}", e.message))?
        .with_api_key(api_key);

    tracing::debug!(api_url = %config.api_url, "connecting alias engine");
    Ok(AliasListEngine::new(AliasClient::new(http, &config.api_url)))
}
