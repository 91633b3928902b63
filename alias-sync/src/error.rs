// alias-sync/src/error.rs
use crate::coordinator::MutationKind;
use alias_client::AliasId;
use thiserror::Error;

/// A command was issued that the engine cannot accept in its current state.
///
/// These are caller mistakes, not remote failures: remote failures are
/// reported through error notifications instead.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("alias {id} is busy with a pending {kind}")]
    Busy { id: AliasId, kind: MutationKind },

    #[error("alias {0} is not in the list")]
    UnknownAlias(AliasId),
}
