// alias-sync/src/coordinator.rs
//! Toggle and delete: one remote mutation per alias at a time.
//!
//! An id is added to the [`InFlightSet`] before the remote call and removed
//! on every exit path. The removal happens in the same critical section that
//! applies the server's answer, or in [`InFlightGuard`]'s `Drop` when the
//! calling future is abandoned.

use crate::engine::{lock, AliasListEngine, SyncState};
use crate::error::CommandError;
use crate::notify::ChangeReason;
use alias_client::{AliasApi, AliasId, ApiError, ErrorKind};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationKind {
    Toggle,
    Delete,
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Toggle => f.write_str("toggle"),
            Self::Delete => f.write_str("delete"),
        }
    }
}

/// How a mutation that was accepted ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The server confirmed and the list reflects it
    Applied,
    /// The server refused; an error notification was raised
    Failed(ErrorKind),
    /// The server confirmed but the alias had already left the list
    Discarded,
}

#[derive(Debug, Default)]
pub(crate) struct InFlightSet {
    ops: HashMap<AliasId, MutationKind>,
}

impl InFlightSet {
    pub fn try_acquire(&mut self, id: AliasId, kind: MutationKind) -> Result<(), CommandError> {
        if let Some(&pending) = self.ops.get(&id) {
            return Err(CommandError::Busy { id, kind: pending });
        }
        self.ops.insert(id, kind);
        Ok(())
    }

    pub fn release(&mut self, id: AliasId) -> bool {
        self.ops.remove(&id).is_some()
    }

    pub fn get(&self, id: AliasId) -> Option<MutationKind> {
        self.ops.get(&id).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Holds an id's slot in the [`InFlightSet`] for the duration of a remote call.
struct InFlightGuard<'a> {
    state: &'a Mutex<SyncState>,
    id: AliasId,
    armed: bool,
}

impl InFlightGuard<'_> {
    /// Release the slot inside a critical section the caller already holds.
    fn release(mut self, state: &mut SyncState) {
        state.in_flight.release(self.id);
        self.armed = false;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = lock(self.state);
        if state.in_flight.release(self.id) {
            debug!(id = %self.id, "mutation abandoned");
            state.publish_change(ChangeReason::LoadingChanged);
        }
    }
}

impl<A: AliasApi> AliasListEngine<A> {
    /// The mutation currently pending for `id`, if any
    pub fn in_flight(&self, id: AliasId) -> Option<MutationKind> {
        self.state().in_flight.get(id)
    }

    /// Claim `id` for `kind` and return the alias's current `enabled`.
    fn begin_mutation(
        &self,
        id: AliasId,
        kind: MutationKind,
    ) -> Result<(bool, InFlightGuard<'_>), CommandError> {
        let mut state = self.state();
        let enabled = match state.store.get(id) {
            Some(alias) => alias.enabled,
            None => {
                warn!(%id, %kind, "mutation requested for unknown alias");
                return Err(CommandError::UnknownAlias(id));
            }
        };
        if let Err(err) = state.in_flight.try_acquire(id, kind) {
            warn!(%id, %kind, "mutation rejected: {}", err);
            return Err(err);
        }
        state.publish_change(ChangeReason::LoadingChanged);

        let guard = InFlightGuard {
            state: &self.shared.state,
            id,
            armed: true,
        };
        Ok((enabled, guard))
    }

    /// Flip `enabled` on an alias and apply the value the server confirms.
    pub async fn toggle(&self, id: AliasId) -> Result<MutationOutcome, CommandError> {
        let (current, guard) = self.begin_mutation(id, MutationKind::Toggle)?;

        let result = self.shared.api.set_alias_enabled(id, !current).await;

        let mut state = self.state();
        guard.release(&mut state);
        let outcome = match result {
            Ok(enabled) => {
                if state.store.set_enabled(id, enabled) {
                    info!(%id, enabled, "alias toggled");
                    state.publish_change(ChangeReason::AliasUpdated(id));
                    MutationOutcome::Applied
                } else {
                    debug!(%id, "toggle confirmed for alias no longer listed");
                    state.publish_change(ChangeReason::LoadingChanged);
                    MutationOutcome::Discarded
                }
            }
            Err(err) => {
                warn!(%id, error = %err, "toggle failed");
                Self::fail_mutation(&mut state, id, &err);
                MutationOutcome::Failed(err.kind())
            }
        };
        Ok(outcome)
    }

    /// Delete an alias. Callers confirm with the user before calling this.
    pub async fn delete(&self, id: AliasId) -> Result<MutationOutcome, CommandError> {
        let (_, guard) = self.begin_mutation(id, MutationKind::Delete)?;

        let result = self.shared.api.delete_alias(id).await;

        let mut state = self.state();
        guard.release(&mut state);
        let outcome = match result {
            // Already gone server side: the user's intent is achieved
            Ok(()) | Err(ApiError::NotFound(_)) => {
                if state.store.remove(id).is_some() {
                    info!(%id, "alias deleted");
                    state.publish_change(ChangeReason::AliasRemoved(id));
                    MutationOutcome::Applied
                } else {
                    debug!(%id, "delete confirmed for alias no longer listed");
                    state.publish_change(ChangeReason::LoadingChanged);
                    MutationOutcome::Discarded
                }
            }
            Err(err) => {
                warn!(%id, error = %err, "delete failed");
                Self::fail_mutation(&mut state, id, &err);
                MutationOutcome::Failed(err.kind())
            }
        };
        Ok(outcome)
    }

    fn fail_mutation(state: &mut SyncState, id: AliasId, err: &ApiError) {
        // A missing alias is dropped from the list even though the call failed
        if matches!(err, ApiError::NotFound(_)) && state.store.remove(id).is_some() {
            state.publish_change(ChangeReason::AliasRemoved(id));
        } else {
            state.publish_change(ChangeReason::LoadingChanged);
        }
        state.raise_error(err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::FetchOutcome;
    use crate::filter::FilterMode;
    use crate::mock::{ApiCall, MockAliasApi};
    use crate::notify::{ChangeNotification, SyncEvent};
    use alias_client::{Alias, AliasPage, Cursor};

    async fn engine_with(aliases: Vec<Alias>) -> (AliasListEngine<MockAliasApi>, MockAliasApi) {
        let api = MockAliasApi::new();
        api.queue_page(Ok(AliasPage {
            aliases,
            next_cursor: Cursor::from_token("1"),
            has_more: true,
        }));
        let engine = AliasListEngine::new(api.clone());
        engine.fetch_next_page().await;
        (engine, api)
    }

    async fn ten_enabled() -> (AliasListEngine<MockAliasApi>, MockAliasApi) {
        engine_with(
            (1..=10)
                .map(|i| Alias::new(i, format!("alias{}@sl.co", i), true))
                .collect(),
        )
        .await
    }

    fn visible_ids(engine: &AliasListEngine<MockAliasApi>) -> Vec<u64> {
        engine.visible().iter().map(|a| a.id.0).collect()
    }

    fn error_kinds(events: &[SyncEvent]) -> Vec<ErrorKind> {
        events
            .iter()
            .filter_map(|e| match e {
                SyncEvent::Error(err) => Some(err.kind),
                SyncEvent::Changed(_) => None,
            })
            .collect()
    }

    fn last_change(events: &[SyncEvent]) -> ChangeNotification {
        events
            .iter()
            .rev()
            .find_map(|e| match e {
                SyncEvent::Changed(c) => Some(c.clone()),
                SyncEvent::Error(_) => None,
            })
            .unwrap()
    }

    #[test]
    fn test_in_flight_set_rejects_second_operation() {
        let mut set = InFlightSet::default();
        set.try_acquire(AliasId(1), MutationKind::Toggle).unwrap();
        assert_eq!(
            set.try_acquire(AliasId(1), MutationKind::Delete),
            Err(CommandError::Busy {
                id: AliasId(1),
                kind: MutationKind::Toggle
            })
        );
        set.try_acquire(AliasId(2), MutationKind::Delete).unwrap();
        assert!(set.release(AliasId(1)));
        assert!(!set.release(AliasId(1)));
        assert!(set.try_acquire(AliasId(1), MutationKind::Delete).is_ok());
    }

    #[tokio::test]
    async fn test_toggle_moves_alias_between_filters() {
        let (engine, api) = ten_enabled().await;
        api.queue_toggle(Ok(false));

        engine.set_filter_mode(FilterMode::Active);
        assert!(visible_ids(&engine).contains(&5));

        let outcome = engine.toggle(AliasId(5)).await.unwrap();
        assert_eq!(outcome, MutationOutcome::Applied);
        assert_eq!(api.calls().last(), Some(&ApiCall::SetEnabled(AliasId(5), false)));
        assert!(!engine.alias(AliasId(5)).unwrap().enabled);
        assert!(!visible_ids(&engine).contains(&5));

        engine.set_filter_mode(FilterMode::Inactive);
        assert_eq!(visible_ids(&engine), vec![5]);
    }

    #[tokio::test]
    async fn test_toggle_changes_only_the_target() {
        let (engine, api) = ten_enabled().await;
        let before = engine.aliases();
        api.queue_toggle(Ok(false));

        engine.toggle(AliasId(3)).await.unwrap();

        let after = engine.aliases();
        assert_eq!(after.len(), before.len());
        for (old, new) in before.iter().zip(after.iter()) {
            assert_eq!(old.id, new.id);
            if old.id == AliasId(3) {
                assert!(!new.enabled);
                assert_eq!(old.email, new.email);
                assert_eq!(old.metadata, new.metadata);
            } else {
                assert_eq!(old, new);
            }
        }
    }

    #[tokio::test]
    async fn test_toggle_applies_server_value_not_request() {
        let (engine, api) = ten_enabled().await;
        // Another client disabled it meanwhile, so our flip re-enabled it
        api.queue_toggle(Ok(true));

        assert_eq!(engine.toggle(AliasId(2)).await.unwrap(), MutationOutcome::Applied);
        assert!(engine.alias(AliasId(2)).unwrap().enabled);
    }

    #[tokio::test]
    async fn test_toggle_failure_leaves_alias_and_releases() {
        let (engine, api) = ten_enabled().await;
        api.queue_toggle(Err(ApiError::Network("timed out".to_string())));
        let mut sub = engine.subscribe();
        sub.drain();

        let outcome = engine.toggle(AliasId(4)).await.unwrap();
        assert_eq!(outcome, MutationOutcome::Failed(ErrorKind::Network));
        assert!(engine.alias(AliasId(4)).unwrap().enabled);
        assert_eq!(engine.in_flight(AliasId(4)), None);

        let events = sub.drain();
        assert_eq!(error_kinds(&events), vec![ErrorKind::Network]);
        assert!(!last_change(&events).loading);

        // Released, so a retry is accepted
        api.queue_toggle(Ok(false));
        assert_eq!(engine.toggle(AliasId(4)).await.unwrap(), MutationOutcome::Applied);
    }

    #[tokio::test]
    async fn test_concurrent_toggle_is_rejected_busy() {
        let (engine, api) = ten_enabled().await;
        api.hold();
        api.queue_toggle(Ok(false));

        let first = tokio::spawn({
            let engine = engine.clone();
            async move { engine.toggle(AliasId(1)).await }
        });
        api.wait_for_calls(2).await;
        assert_eq!(engine.in_flight(AliasId(1)), Some(MutationKind::Toggle));
        assert!(engine.is_loading());

        assert_eq!(
            engine.toggle(AliasId(1)).await,
            Err(CommandError::Busy {
                id: AliasId(1),
                kind: MutationKind::Toggle
            })
        );
        assert!(matches!(
            engine.delete(AliasId(1)).await,
            Err(CommandError::Busy { .. })
        ));

        api.release(1);
        assert_eq!(first.await.unwrap(), Ok(MutationOutcome::Applied));
        assert!(!engine.alias(AliasId(1)).unwrap().enabled);

        let toggles = api
            .calls()
            .into_iter()
            .filter(|c| matches!(c, ApiCall::SetEnabled(..)))
            .count();
        assert_eq!(toggles, 1);
        assert!(!engine.is_loading());
    }

    #[tokio::test]
    async fn test_mutations_on_different_aliases_run_together() {
        let (engine, api) = ten_enabled().await;
        api.hold();
        api.queue_toggle(Ok(false));

        let toggle = tokio::spawn({
            let engine = engine.clone();
            async move { engine.toggle(AliasId(1)).await }
        });
        let delete = tokio::spawn({
            let engine = engine.clone();
            async move { engine.delete(AliasId(2)).await }
        });
        api.wait_for_calls(3).await;

        api.release(2);
        assert_eq!(toggle.await.unwrap(), Ok(MutationOutcome::Applied));
        assert_eq!(delete.await.unwrap(), Ok(MutationOutcome::Applied));
        assert_eq!(engine.aliases().len(), 9);
    }

    #[tokio::test]
    async fn test_mutation_on_unknown_alias() {
        let (engine, api) = ten_enabled().await;
        assert_eq!(
            engine.toggle(AliasId(99)).await,
            Err(CommandError::UnknownAlias(AliasId(99)))
        );
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_removes_from_every_view() {
        let (engine, api) = ten_enabled().await;
        api.queue_delete(Ok(()));
        let mut sub = engine.subscribe();
        sub.drain();

        assert_eq!(engine.delete(AliasId(7)).await.unwrap(), MutationOutcome::Applied);
        assert!(engine.alias(AliasId(7)).is_none());
        for mode in FilterMode::ALL_MODES {
            engine.set_filter_mode(mode);
            assert!(!visible_ids(&engine).contains(&7));
        }

        let events = sub.drain();
        let removed = events.iter().any(|e| {
            matches!(e, SyncEvent::Changed(c) if c.reason == ChangeReason::AliasRemoved(AliasId(7)))
        });
        assert!(removed);
    }

    #[tokio::test]
    async fn test_delete_server_error_keeps_alias_and_raises_once() {
        let (engine, api) = ten_enabled().await;
        let before = engine.alias(AliasId(7)).unwrap();
        api.queue_delete(Err(ApiError::Server("internal error".to_string())));
        let mut sub = engine.subscribe();
        sub.drain();

        let outcome = engine.delete(AliasId(7)).await.unwrap();
        assert_eq!(outcome, MutationOutcome::Failed(ErrorKind::Server));
        assert_eq!(engine.alias(AliasId(7)), Some(before));

        let events = sub.drain();
        assert_eq!(error_kinds(&events), vec![ErrorKind::Server]);
        match events.last() {
            Some(SyncEvent::Error(err)) => assert_eq!(err.message, "internal error"),
            other => panic!("expected error last, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_not_found_removes_locally_without_error() {
        let (engine, api) = ten_enabled().await;
        api.queue_delete(Err(ApiError::NotFound("gone".to_string())));
        let mut sub = engine.subscribe();
        sub.drain();

        assert_eq!(engine.delete(AliasId(3)).await.unwrap(), MutationOutcome::Applied);
        assert!(engine.alias(AliasId(3)).is_none());
        assert!(error_kinds(&sub.drain()).is_empty());
    }

    #[tokio::test]
    async fn test_toggle_not_found_removes_locally_and_reports() {
        let (engine, api) = ten_enabled().await;
        api.queue_toggle(Err(ApiError::NotFound("gone".to_string())));
        let mut sub = engine.subscribe();
        sub.drain();

        let outcome = engine.toggle(AliasId(3)).await.unwrap();
        assert_eq!(outcome, MutationOutcome::Failed(ErrorKind::NotFound));
        assert!(engine.alias(AliasId(3)).is_none());
        assert_eq!(error_kinds(&sub.drain()), vec![ErrorKind::NotFound]);
    }

    #[tokio::test]
    async fn test_late_toggle_after_delete_is_discarded() {
        let (engine, api) = ten_enabled().await;
        api.hold();
        api.queue_toggle(Ok(false));

        let toggle = tokio::spawn({
            let engine = engine.clone();
            async move { engine.toggle(AliasId(6)).await }
        });
        api.wait_for_calls(2).await;

        // The alias disappears by another path while the toggle is pending
        engine.state().store.remove(AliasId(6));

        api.release(1);
        assert_eq!(toggle.await.unwrap(), Ok(MutationOutcome::Discarded));
        assert!(engine.alias(AliasId(6)).is_none());
        assert!(engine.pending_errors().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_in_flight_does_not_undo_toggle() {
        let (engine, api) = ten_enabled().await;
        api.hold();
        // Page one as the server saw it before the toggle
        api.queue_page(Ok(AliasPage {
            aliases: (1..=10)
                .map(|i| Alias::new(i, format!("alias{}@sl.co", i), true))
                .collect(),
            next_cursor: Cursor::from_token("1"),
            has_more: true,
        }));
        api.queue_toggle(Ok(false));

        let refresh = tokio::spawn({
            let engine = engine.clone();
            async move { engine.refresh().await }
        });
        api.wait_for_calls(2).await;
        let toggle = tokio::spawn({
            let engine = engine.clone();
            async move { engine.toggle(AliasId(8)).await }
        });
        api.wait_for_calls(3).await;

        // Toggle answer first, then the stale page
        api.release_call(ApiCall::SetEnabled(AliasId(8), false));
        assert_eq!(toggle.await.unwrap(), Ok(MutationOutcome::Applied));
        api.release(1);
        assert!(matches!(refresh.await.unwrap(), FetchOutcome::Synced(_)));

        assert!(!engine.alias(AliasId(8)).unwrap().enabled);
    }

    #[tokio::test]
    async fn test_dropped_toggle_releases_the_alias() {
        let (engine, api) = ten_enabled().await;
        api.hold();

        let task = tokio::spawn({
            let engine = engine.clone();
            async move { engine.toggle(AliasId(1)).await }
        });
        api.wait_for_calls(2).await;
        task.abort();
        let _ = task.await;

        assert_eq!(engine.in_flight(AliasId(1)), None);
        assert!(!engine.is_loading());
        assert!(engine.alias(AliasId(1)).unwrap().enabled);
    }
}
