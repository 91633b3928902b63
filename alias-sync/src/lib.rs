// alias-sync/src/lib.rs
pub mod client;
pub mod config;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod filter;
pub mod notify;
pub mod store;

#[cfg(test)]
mod mock;

pub use client::{connect, SimpleLoginEngine};
pub use config::Config;
pub use coordinator::{MutationKind, MutationOutcome};
pub use engine::{AliasListEngine, FetchOutcome};
pub use error::CommandError;
pub use filter::{project, FilterMode};
pub use notify::{
    ChangeNotification, ChangeReason, ErrorNotification, Subscription, SubscriptionId, SyncEvent,
};
pub use store::PageMerge;

// Re-export API types for convenience
pub use alias_client::{Alias, AliasApi, AliasId, AliasPage, ApiError, Cursor, ErrorKind};
