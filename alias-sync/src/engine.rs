// alias-sync/src/engine.rs
//! [`AliasListEngine`]: the single owner of the alias list.
//!
//! All state lives in one [`SyncState`] behind a `std::sync::Mutex`. The lock
//! is only taken between suspension points, never across a remote call, and
//! every notification is published while the lock that applied its
//! transition is still held, so observers see transitions in order.

use crate::coordinator::InFlightSet;
use crate::filter::{self, FilterMode};
use crate::notify::{
    ChangeNotification, ChangeReason, ErrorNotification, Notifier, Subscription, SubscriptionId,
    SyncEvent,
};
use crate::store::{AliasStore, FetchKind, PageMerge};
use alias_client::{Alias, AliasApi, AliasId, ApiError, ErrorKind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Result of `fetch_next_page` or `refresh`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Another fetch was in flight, or there are no more pages
    Skipped,
    Appended(PageMerge),
    Synced(PageMerge),
    Failed(ErrorKind),
}

#[derive(Debug, Default)]
pub(crate) struct SyncState {
    pub store: AliasStore,
    pub filter_mode: FilterMode,
    pub in_flight: InFlightSet,
    pub notifier: Notifier,
}

impl SyncState {
    pub fn is_loading(&self) -> bool {
        self.store.is_fetching() || !self.in_flight.is_empty()
    }

    pub fn change(&self, reason: ChangeReason) -> ChangeNotification {
        ChangeNotification {
            reason,
            visible: filter::project(self.store.aliases(), self.filter_mode)
                .into_iter()
                .cloned()
                .collect(),
            filter_mode: self.filter_mode,
            loading: self.is_loading(),
            refreshing: self.store.is_refreshing(),
            has_more: self.store.has_more(),
            total: self.store.len(),
        }
    }

    pub fn publish_change(&mut self, reason: ChangeReason) {
        let change = self.change(reason);
        self.notifier.publish(SyncEvent::Changed(change));
    }

    pub fn raise_error(&mut self, err: &ApiError) {
        let raised = self.notifier.raise_error(ErrorNotification {
            kind: err.kind(),
            message: err.human_message(),
        });
        if !raised {
            debug!(kind = %err.kind(), "error of this kind still unacknowledged, not re-raised");
        }
    }
}

pub(crate) fn lock(state: &Mutex<SyncState>) -> MutexGuard<'_, SyncState> {
    // State is only mutated by short synchronous sections, so a panic inside
    // one leaves it usable.
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) struct Shared<A> {
    pub api: A,
    pub state: Mutex<SyncState>,
}

/// Paginated, filterable alias list kept in sync with an [`AliasApi`].
///
/// Cloning is cheap and every clone drives the same list, so commands can be
/// issued from concurrent tasks.
pub struct AliasListEngine<A: AliasApi> {
    pub(crate) shared: Arc<Shared<A>>,
}

impl<A: AliasApi> Clone for AliasListEngine<A> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<A: AliasApi> AliasListEngine<A> {
    pub fn new(api: A) -> Self {
        Self {
            shared: Arc::new(Shared {
                api,
                state: Mutex::new(SyncState::default()),
            }),
        }
    }

    pub fn api(&self) -> &A {
        &self.shared.api
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, SyncState> {
        lock(&self.shared.state)
    }

    // Observers

    /// Attach an observer. It immediately receives a snapshot of the current
    /// view followed by any unacknowledged errors.
    pub fn subscribe(&self) -> Subscription {
        let mut state = self.state();
        let snapshot = SyncEvent::Changed(state.change(ChangeReason::Snapshot));
        state.notifier.subscribe(snapshot)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.state().notifier.unsubscribe(id)
    }

    /// Mark the error of `kind` as handled so the next one can be raised.
    pub fn acknowledge_error(&self, kind: ErrorKind) -> bool {
        self.state().notifier.acknowledge(kind)
    }

    pub fn pending_errors(&self) -> Vec<ErrorNotification> {
        self.state().notifier.pending_errors().cloned().collect()
    }

    // Queries

    pub fn snapshot(&self) -> ChangeNotification {
        self.state().change(ChangeReason::Snapshot)
    }

    pub fn visible(&self) -> Vec<Alias> {
        self.snapshot().visible
    }

    /// The unfiltered list in server order
    pub fn aliases(&self) -> Vec<Alias> {
        self.state().store.aliases().to_vec()
    }

    pub fn alias(&self, id: AliasId) -> Option<Alias> {
        self.state().store.get(id).cloned()
    }

    pub fn filter_mode(&self) -> FilterMode {
        self.state().filter_mode
    }

    pub fn has_more(&self) -> bool {
        self.state().store.has_more()
    }

    /// True once a page has been loaded. An empty view before that means "not loaded yet".
    pub fn is_loaded(&self) -> bool {
        self.state().store.is_loaded()
    }

    pub fn is_loading(&self) -> bool {
        self.state().is_loading()
    }

    pub fn is_refreshing(&self) -> bool {
        self.state().store.is_refreshing()
    }

    // Commands

    /// Switch the visible subset. Never fetches.
    pub fn set_filter_mode(&self, mode: FilterMode) -> bool {
        let mut state = self.state();
        if state.filter_mode == mode {
            return false;
        }
        state.filter_mode = mode;
        state.publish_change(ChangeReason::FilterChanged);
        true
    }

    /// Load the page after the current cursor.
    pub async fn fetch_next_page(&self) -> FetchOutcome {
        self.run_fetch(FetchKind::Page).await
    }

    /// Reload page one. Aliases missing from it are kept.
    pub async fn refresh(&self) -> FetchOutcome {
        self.run_fetch(FetchKind::Refresh).await
    }

    async fn run_fetch(&self, kind: FetchKind) -> FetchOutcome {
        let request = {
            let mut state = self.state();
            match state.store.begin_fetch(kind) {
                Some(request) => {
                    state.publish_change(ChangeReason::LoadingChanged);
                    request
                }
                None => {
                    debug!(
                        ?kind,
                        fetching = state.store.is_fetching(),
                        has_more = state.store.has_more(),
                        "fetch skipped"
                    );
                    return FetchOutcome::Skipped;
                }
            }
        };

        let guard = FetchGuard {
            state: &self.shared.state,
            seq: request.seq,
            armed: true,
        };
        let result = self.shared.api.list_aliases(&request.cursor).await;
        guard.disarm();

        let mut state = self.state();
        match result {
            Ok(page) => {
                let Some(merge) = state.store.finish_fetch(request.seq, page) else {
                    return FetchOutcome::Skipped;
                };
                info!(
                    ?kind,
                    added = merge.added,
                    replaced = merge.replaced,
                    skipped = merge.skipped,
                    total = state.store.len(),
                    has_more = state.store.has_more(),
                    "alias page applied"
                );
                match kind {
                    FetchKind::Page => {
                        state.publish_change(ChangeReason::PageAppended);
                        FetchOutcome::Appended(merge)
                    }
                    FetchKind::Refresh => {
                        state.publish_change(ChangeReason::Synced);
                        FetchOutcome::Synced(merge)
                    }
                }
            }
            Err(err) => {
                warn!(?kind, error = %err, "alias fetch failed");
                state.store.abort_fetch(request.seq);
                state.publish_change(ChangeReason::LoadingChanged);
                state.raise_error(&err);
                FetchOutcome::Failed(err.kind())
            }
        }
    }
}

/// Frees the fetch slot if the fetching future is dropped mid-request.
struct FetchGuard<'a> {
    state: &'a Mutex<SyncState>,
    seq: u64,
    armed: bool,
}

impl FetchGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = lock(self.state);
        if state.store.abort_fetch(self.seq) {
            debug!(seq = self.seq, "fetch abandoned");
            state.publish_change(ChangeReason::LoadingChanged);
        }
    }
}
