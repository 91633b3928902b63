// alias-client/src/lib.rs
pub mod api;
pub mod client;
pub mod error;
pub mod http;
pub mod types;

pub use api::AliasApi;
pub use client::{AliasClient, PAGE_SIZE};
pub use error::{ApiError, ErrorKind};
pub use http::{HttpClient, HttpError};
pub use types::{Alias, AliasId, AliasMetadata, AliasPage, Cursor};

// Re-export reqwest client when feature is enabled
#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
