// alias-sync/src/notify.rs
//! Observer side of the engine: subscriptions, change and error notifications.

use crate::filter::FilterMode;
use alias_client::{Alias, AliasId, ErrorKind};
use serde::Serialize;
use std::collections::BTreeMap;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Why a [`ChangeNotification`] was emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "id")]
pub enum ChangeReason {
    /// Current state replayed to a new subscriber
    Snapshot,
    /// A fetch or mutation started or ended without changing the list
    LoadingChanged,
    /// A page fetched with `fetch_next_page` was merged
    PageAppended,
    /// A refresh completed; the list is up to date with the server
    Synced,
    AliasUpdated(AliasId),
    AliasRemoved(AliasId),
    FilterChanged,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeNotification {
    pub reason: ChangeReason,
    pub visible: Vec<Alias>,
    pub filter_mode: FilterMode,
    pub loading: bool,
    pub refreshing: bool,
    pub has_more: bool,
    /// Size of the unfiltered collection
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorNotification {
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    Changed(ChangeNotification),
    Error(ErrorNotification),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Receiving end handed to an observer. Dropping it detaches the observer.
///
/// The queue behind it is unbounded and every change carries a full visible
/// list, so an observer that stops reading keeps that backlog alive until it
/// drains, drops the subscription, or is unsubscribed.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    receiver: UnboundedReceiver<SyncEvent>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Wait for the next event. `None` once the subscription was removed.
    pub async fn recv(&mut self) -> Option<SyncEvent> {
        self.receiver.recv().await
    }

    /// Next already-delivered event, if any
    pub fn try_recv(&mut self) -> Option<SyncEvent> {
        self.receiver.try_recv().ok()
    }

    /// Everything delivered so far
    pub fn drain(&mut self) -> Vec<SyncEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

#[derive(Debug, Default)]
pub(crate) struct Notifier {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, UnboundedSender<SyncEvent>)>,
    /// Raised but not yet acknowledged; at most one per kind
    pending_errors: BTreeMap<ErrorKind, ErrorNotification>,
}

impl Notifier {
    /// Attach a new observer, replaying `snapshot` and any unacknowledged errors to it.
    pub fn subscribe(&mut self, snapshot: SyncEvent) -> Subscription {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        let (sender, receiver) = mpsc::unbounded_channel();

        // The receiver is alive, so these sends cannot fail
        let _ = sender.send(snapshot);
        for error in self.pending_errors.values() {
            let _ = sender.send(SyncEvent::Error(error.clone()));
        }

        self.subscribers.push((id, sender));
        Subscription { id, receiver }
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
        self.subscribers.len() != before
    }

    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn publish(&mut self, event: SyncEvent) {
        // Receivers that were dropped are pruned here
        self.subscribers
            .retain(|(_, sender)| sender.send(event.clone()).is_ok());
    }

    /// Publish an error unless one of the same kind is still unacknowledged.
    pub fn raise_error(&mut self, error: ErrorNotification) -> bool {
        if self.pending_errors.contains_key(&error.kind) {
            return false;
        }
        self.pending_errors.insert(error.kind, error.clone());
        self.publish(SyncEvent::Error(error));
        true
    }

    pub fn acknowledge(&mut self, kind: ErrorKind) -> bool {
        self.pending_errors.remove(&kind).is_some()
    }

    pub fn pending_errors(&self) -> impl Iterator<Item = &ErrorNotification> {
        self.pending_errors.values()
    }
}
