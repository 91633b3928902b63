// alias-client/src/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-assigned alias identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasId(pub u64);

impl std::fmt::Display for AliasId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for AliasId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(AliasId)
    }
}

/// SimpleLogin alias object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alias {
    pub id: AliasId,
    pub email: String,
    pub enabled: bool,
    #[serde(flatten)]
    pub metadata: AliasMetadata,
}

/// Display fields carried along untouched by the sync engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AliasMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    /// Unix seconds
    #[serde(default)]
    pub creation_timestamp: Option<i64>,
    #[serde(default)]
    pub nb_forward: u32,
    #[serde(default)]
    pub nb_block: u32,
    #[serde(default)]
    pub nb_reply: u32,
    #[serde(default)]
    pub pinned: bool,
}

impl Alias {
    pub fn new(id: u64, email: impl Into<String>, enabled: bool) -> Self {
        Self {
            id: AliasId(id),
            email: email.into(),
            enabled,
            metadata: AliasMetadata::default(),
        }
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.metadata
            .creation_timestamp
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
    }
}

/// Opaque pagination position. The default value is the start of the list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor(Option<String>);

impl Cursor {
    pub fn start() -> Self {
        Self(None)
    }

    pub fn from_token(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    pub fn token(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_start(&self) -> bool {
        self.0.is_none()
    }
}

/// One page returned by [`AliasApi::list_aliases`](crate::AliasApi::list_aliases)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AliasPage {
    pub aliases: Vec<Alias>,
    pub next_cursor: Cursor,
    pub has_more: bool,
}

/// Body of `GET /api/v2/aliases`
#[derive(Debug, Deserialize)]
pub(crate) struct AliasListResponse {
    pub aliases: Vec<Alias>,
}

/// Body of `POST /api/aliases/{id}/toggle`
#[derive(Debug, Deserialize)]
pub(crate) struct ToggleResponse {
    pub enabled: bool,
}
