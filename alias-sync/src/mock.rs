// alias-sync/src/mock.rs
//! Scripted [`AliasApi`] for engine tests.
//!
//! Responses are queued per operation. When held, every call parks until the
//! test releases it, which lets tests interleave requests deterministically.

use alias_client::{AliasApi, AliasId, AliasPage, ApiError, Cursor};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    List(Cursor),
    SetEnabled(AliasId, bool),
    Delete(AliasId),
}

#[derive(Default)]
struct MockInner {
    pages: VecDeque<Result<AliasPage, ApiError>>,
    toggles: VecDeque<Result<bool, ApiError>>,
    deletes: VecDeque<Result<(), ApiError>>,
    calls: Vec<ApiCall>,
    held: bool,
    waiting: Vec<(ApiCall, oneshot::Sender<()>)>,
}

#[derive(Clone, Default)]
pub struct MockAliasApi {
    inner: Arc<Mutex<MockInner>>,
}

impl MockAliasApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_page(&self, page: Result<AliasPage, ApiError>) {
        self.inner.lock().unwrap().pages.push_back(page);
    }

    pub fn queue_toggle(&self, enabled: Result<bool, ApiError>) {
        self.inner.lock().unwrap().toggles.push_back(enabled);
    }

    pub fn queue_delete(&self, result: Result<(), ApiError>) {
        self.inner.lock().unwrap().deletes.push_back(result);
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Park every following call until released.
    pub fn hold(&self) {
        self.inner.lock().unwrap().held = true;
    }

    pub fn unhold(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.held = false;
        for (_, sender) in inner.waiting.drain(..) {
            let _ = sender.send(());
        }
    }

    /// Let the `n` oldest parked calls proceed.
    pub fn release(&self, n: usize) {
        let mut inner = self.inner.lock().unwrap();
        assert!(inner.waiting.len() >= n, "only {} calls parked", inner.waiting.len());
        for (_, sender) in inner.waiting.drain(..n) {
            let _ = sender.send(());
        }
    }

    /// Let one specific parked call proceed.
    pub fn release_call(&self, call: ApiCall) {
        let mut inner = self.inner.lock().unwrap();
        let index = inner
            .waiting
            .iter()
            .position(|(parked, _)| *parked == call)
            .expect("call is not parked");
        let (_, sender) = inner.waiting.remove(index);
        let _ = sender.send(());
    }

    /// Yield to other tasks until `n` calls have been made.
    pub async fn wait_for_calls(&self, n: usize) {
        for _ in 0..10_000 {
            if self.inner.lock().unwrap().calls.len() >= n {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("expected {} calls, saw {:?}", n, self.calls());
    }

    async fn record(&self, call: ApiCall) {
        let parked = {
            let mut inner = self.inner.lock().unwrap();
            inner.calls.push(call.clone());
            if inner.held {
                let (sender, receiver) = oneshot::channel();
                inner.waiting.push((call, sender));
                Some(receiver)
            } else {
                None
            }
        };
        if let Some(receiver) = parked {
            let _ = receiver.await;
        }
    }
}

#[async_trait]
impl AliasApi for MockAliasApi {
    async fn list_aliases(&self, cursor: &Cursor) -> Result<AliasPage, ApiError> {
        self.record(ApiCall::List(cursor.clone())).await;
        self.inner
            .lock()
            .unwrap()
            .pages
            .pop_front()
            .unwrap_or_else(|| Ok(AliasPage::default()))
    }

    async fn set_alias_enabled(&self, id: AliasId, desired: bool) -> Result<bool, ApiError> {
        self.record(ApiCall::SetEnabled(id, desired)).await;
        self.inner
            .lock()
            .unwrap()
            .toggles
            .pop_front()
            .unwrap_or(Ok(desired))
    }

    async fn delete_alias(&self, id: AliasId) -> Result<(), ApiError> {
        self.record(ApiCall::Delete(id)).await;
        self.inner
            .lock()
            .unwrap()
            .deletes
            .pop_front()
            .unwrap_or(Ok(()))
    }
}
