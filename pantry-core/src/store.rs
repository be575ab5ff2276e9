//! Client-side ingredient inventory
//!
//! `IngredientStore` is the single owner of the ingredient collection. Every
//! effect (refresh result, commit result, optimistic delete, rollback) is
//! applied under one write lock, one at a time, in the order the effects
//! resolve. Network calls are made without holding the lock. Operations run
//! to completion even when the caller's future is dropped.
//!
//! Invariants:
//! - ids are unique within the collection
//! - a failed operation leaves the visible collection as it was before it
//! - a refresh never drops a commit or resurrects a delete that completed
//!   after the refresh was started

use crate::builder;
use crate::error::StoreError;
use crate::gateway::SyncGateway;
use crate::model::{Draft, Ingredient};
use pantry_common::events::EventBus;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

const EVENT_CAPACITY: usize = 64;

/// Change notification for presentation layers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// Collection replaced by a server snapshot
    Refreshed { count: usize },
    /// Newly persisted ingredient appended
    Added { id: i64 },
    /// Ingredient optimistically removed
    Removed { id: i64 },
    /// Failed delete rolled back
    Restored { id: i64 },
}

#[derive(Debug, Clone)]
struct Entry {
    ingredient: Ingredient,
    /// Delete request in flight; hidden from readers but keeps its slot
    /// so a rollback restores the exact position
    pending_delete: bool,
}

impl Entry {
    fn visible(ingredient: Ingredient) -> Self {
        Self {
            ingredient,
            pending_delete: false,
        }
    }
}

/// Remote effect confirmed while a refresh may have been in flight
#[derive(Debug, Clone)]
enum Applied {
    Created(Ingredient),
    Deleted(i64),
}

#[derive(Debug, Default)]
struct StoreState {
    entries: Vec<Entry>,
    in_flight_commits: HashSet<Uuid>,
    pending_deletes: HashSet<i64>,
    /// Count of confirmed commits and deletes
    seq: u64,
    /// Confirmed effects, kept only while a refresh is outstanding
    journal: Vec<(u64, Applied)>,
    refreshes_in_flight: usize,
}

impl StoreState {
    fn snapshot(&self) -> Vec<Ingredient> {
        self.entries
            .iter()
            .filter(|e| !e.pending_delete)
            .map(|e| e.ingredient.clone())
            .collect()
    }

    fn position(&self, id: i64) -> Option<usize> {
        self.entries.iter().position(|e| e.ingredient.id == id)
    }

    fn record(&mut self, applied: Applied) {
        self.seq += 1;
        if self.refreshes_in_flight > 0 {
            self.journal.push((self.seq, applied));
        }
    }

    fn finish_refresh(&mut self) {
        self.refreshes_in_flight -= 1;
        if self.refreshes_in_flight == 0 {
            self.journal.clear();
        }
    }

    /// Replace the collection with a server snapshot, replaying effects the
    /// snapshot may predate
    fn reconcile(&mut self, snapshot: Vec<Ingredient>, started_at: u64) {
        let mut seen = HashSet::with_capacity(snapshot.len());
        let mut entries = Vec::with_capacity(snapshot.len());
        for ingredient in snapshot {
            if !seen.insert(ingredient.id) {
                warn!(id = ingredient.id, "Duplicate id in server snapshot, keeping first");
                continue;
            }
            entries.push(Entry::visible(ingredient));
        }

        for (_, applied) in self.journal.iter().filter(|(seq, _)| *seq > started_at) {
            match applied {
                Applied::Created(ingredient) => {
                    if seen.insert(ingredient.id) {
                        entries.push(Entry::visible(ingredient.clone()));
                    }
                }
                Applied::Deleted(id) => {
                    entries.retain(|e| e.ingredient.id != *id);
                    seen.remove(id);
                }
            }
        }

        for entry in &mut entries {
            entry.pending_delete = self.pending_deletes.contains(&entry.ingredient.id);
        }

        self.entries = entries;
    }
}

/// Authoritative client-side ingredient collection
///
/// Clones share one collection. Refresh, commit and delete run on a spawned
/// task, so once started they finish and settle the collection even if the
/// caller stops waiting for the result.
#[derive(Clone)]
pub struct IngredientStore {
    inner: Arc<StoreInner>,
}

impl IngredientStore {
    pub fn new(gateway: Arc<dyn SyncGateway>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                gateway,
                state: RwLock::new(StoreState::default()),
                events: EventBus::new(EVENT_CAPACITY),
            }),
        }
    }

    /// Current collection, no network
    pub async fn list(&self) -> Vec<Ingredient> {
        self.inner.state.read().await.snapshot()
    }

    pub async fn get(&self, id: i64) -> Option<Ingredient> {
        let state = self.inner.state.read().await;
        state
            .entries
            .iter()
            .find(|e| e.ingredient.id == id && !e.pending_delete)
            .map(|e| e.ingredient.clone())
    }

    /// Receive a [`StoreEvent`] for every applied mutation
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.events.subscribe()
    }

    /// Replace the collection with the server's authoritative set
    ///
    /// On failure the previous snapshot is kept.
    pub async fn refresh(&self) -> Result<Vec<Ingredient>, StoreError> {
        let inner = Arc::clone(&self.inner);
        run_detached(async move { inner.refresh().await }).await
    }

    /// Persist a draft and append it with its server id
    ///
    /// Nothing is added on failure; the caller keeps the draft for retry.
    pub async fn commit(&self, draft: Draft) -> Result<Ingredient, StoreError> {
        let draft = builder::validate(draft)?;
        let inner = Arc::clone(&self.inner);
        run_detached(async move { inner.commit(draft).await }).await
    }

    /// Optimistically remove an ingredient, restoring it if the remote delete fails
    ///
    /// Unknown ids (including ones already being deleted) succeed as a no-op.
    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let inner = Arc::clone(&self.inner);
        run_detached(async move { inner.delete(id).await }).await
    }
}

/// Await an operation on its own task
///
/// Dropping the returned future detaches the task instead of cancelling it.
async fn run_detached<T, F>(operation: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, StoreError>> + Send + 'static,
{
    match tokio::spawn(operation).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => {
            warn!(error = %e, "Store operation aborted");
            Err(StoreError::Interrupted(e.to_string()))
        }
    }
}

struct StoreInner {
    gateway: Arc<dyn SyncGateway>,
    state: RwLock<StoreState>,
    events: EventBus<StoreEvent>,
}

impl StoreInner {
    async fn refresh(&self) -> Result<Vec<Ingredient>, StoreError> {
        let started_at = {
            let mut state = self.state.write().await;
            state.refreshes_in_flight += 1;
            state.seq
        };

        let result = self.gateway.fetch_all().await;

        let mut state = self.state.write().await;
        let outcome = match result {
            Ok(snapshot) => {
                state.reconcile(snapshot, started_at);
                let visible = state.snapshot();
                info!(count = visible.len(), "Ingredients refreshed");
                self.events.emit_lossy(StoreEvent::Refreshed {
                    count: visible.len(),
                });
                Ok(visible)
            }
            Err(e) => {
                warn!(error = %e, "Refresh failed, keeping previous snapshot");
                Err(StoreError::RefreshFailure(e))
            }
        };
        state.finish_refresh();
        outcome
    }

    async fn commit(&self, draft: Draft) -> Result<Ingredient, StoreError> {
        let draft_id = draft.draft_id;

        {
            let mut state = self.state.write().await;
            if !state.in_flight_commits.insert(draft_id) {
                debug!(draft_id = %draft_id, "Rejected duplicate commit");
                return Err(StoreError::CommitInFlight);
            }
        }

        let result = self.gateway.create(&draft).await;

        let mut state = self.state.write().await;
        state.in_flight_commits.remove(&draft_id);

        let id = result.map_err(|e| {
            warn!(name = %draft.name, error = %e, "Commit failed");
            StoreError::PersistFailure(e)
        })?;

        let ingredient = draft.into_persisted(id);
        match state.position(id) {
            // A refresh already echoed this record back
            Some(pos) => state.entries[pos].ingredient = ingredient.clone(),
            None => state.entries.push(Entry::visible(ingredient.clone())),
        }
        state.record(Applied::Created(ingredient.clone()));

        info!(id, name = %ingredient.name, "Ingredient committed");
        self.events.emit_lossy(StoreEvent::Added { id });
        Ok(ingredient)
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        {
            let mut state = self.state.write().await;
            let Some(pos) = state.position(id) else {
                debug!(id, "Delete of unknown id ignored");
                return Ok(());
            };
            if state.entries[pos].pending_delete {
                debug!(id, "Delete already in flight");
                return Ok(());
            }
            state.entries[pos].pending_delete = true;
            state.pending_deletes.insert(id);
            self.events.emit_lossy(StoreEvent::Removed { id });
        }

        let result = self.gateway.delete(id).await;

        let mut state = self.state.write().await;
        state.pending_deletes.remove(&id);

        match result {
            Ok(()) => {
                state.entries.retain(|e| e.ingredient.id != id);
                state.record(Applied::Deleted(id));
                info!(id, "Ingredient deleted");
                Ok(())
            }
            Err(e) => {
                // A refresh may have dropped the entry meanwhile; then there is nothing to restore
                if let Some(pos) = state.position(id) {
                    state.entries[pos].pending_delete = false;
                    self.events.emit_lossy(StoreEvent::Restored { id });
                }
                warn!(id, error = %e, "Delete failed, ingredient restored");
                Err(StoreError::DeleteFailure { id, source: e })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DraftField, RemoteError};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Gateway answering from fixed data
    #[derive(Default)]
    struct ScriptedGateway {
        listing: Mutex<Vec<Ingredient>>,
        next_id: Mutex<i64>,
        fail_create: Option<RemoteError>,
        fail_delete: Option<RemoteError>,
        fail_fetch: Option<RemoteError>,
        creates: Mutex<usize>,
    }

    #[async_trait]
    impl SyncGateway for ScriptedGateway {
        async fn fetch_all(&self) -> Result<Vec<Ingredient>, RemoteError> {
            match &self.fail_fetch {
                Some(e) => Err(e.clone()),
                None => Ok(self.listing.lock().unwrap().clone()),
            }
        }

        async fn create(&self, _draft: &Draft) -> Result<i64, RemoteError> {
            *self.creates.lock().unwrap() += 1;
            if let Some(e) = &self.fail_create {
                return Err(e.clone());
            }
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            Ok(*next)
        }

        async fn delete(&self, _id: i64) -> Result<(), RemoteError> {
            match &self.fail_delete {
                Some(e) => Err(e.clone()),
                None => Ok(()),
            }
        }
    }

    fn item(id: i64, name: &str) -> Ingredient {
        Ingredient {
            id,
            name: name.into(),
            quantity: "1".into(),
            expiry_date: None,
        }
    }

    fn ids(items: &[Ingredient]) -> Vec<i64> {
        items.iter().map(|i| i.id).collect()
    }

    #[tokio::test]
    async fn test_empty_name_fails_validation_without_request() {
        let gateway = Arc::new(ScriptedGateway::default());
        let store = IngredientStore::new(gateway.clone());

        let err = store.commit(Draft::new("", "1")).await.unwrap_err();

        assert_eq!(
            err,
            StoreError::Validation(crate::error::ValidationError {
                missing_fields: vec![DraftField::Name]
            })
        );
        assert!(store.list().await.is_empty());
        assert_eq!(*gateway.creates.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_commit_appends_in_creation_order() {
        let gateway = Arc::new(ScriptedGateway {
            next_id: Mutex::new(41),
            ..Default::default()
        });
        let store = IngredientStore::new(gateway);

        let milk = store
            .commit(Draft::new("Milk", "1").with_expiry("2024-01-01"))
            .await
            .unwrap();
        store.commit(Draft::new("Eggs", "12")).await.unwrap();

        assert_eq!(milk.id, 42);
        let items = store.list().await;
        assert_eq!(ids(&items), vec![42, 43]);
        assert_eq!(items[0].name, "Milk");
        assert_eq!(items[0].expiry_date.as_deref(), Some("2024-01-01"));
        assert_eq!(store.get(42).await, Some(milk));
    }

    #[tokio::test]
    async fn test_commit_failure_leaves_collection_unchanged() {
        let gateway = Arc::new(ScriptedGateway {
            fail_create: Some(RemoteError::Timeout),
            ..Default::default()
        });
        let store = IngredientStore::new(gateway);

        let err = store.commit(Draft::new("Milk", "1")).await.unwrap_err();

        assert_eq!(err, StoreError::PersistFailure(RemoteError::Timeout));
        assert!(store.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_unknown_id_is_noop() {
        let gateway = Arc::new(ScriptedGateway {
            listing: Mutex::new(vec![item(1, "Milk")]),
            ..Default::default()
        });
        let store = IngredientStore::new(gateway);
        store.refresh().await.unwrap();

        store.delete(999).await.unwrap();
        assert_eq!(ids(&store.list().await), vec![1]);
    }

    #[tokio::test]
    async fn test_delete_failure_restores_position() {
        let gateway = Arc::new(ScriptedGateway {
            listing: Mutex::new(vec![item(1, "a"), item(2, "b"), item(3, "c")]),
            fail_delete: Some(RemoteError::Network("unreachable".into())),
            ..Default::default()
        });
        let store = IngredientStore::new(gateway);
        store.refresh().await.unwrap();

        let err = store.delete(2).await.unwrap_err();

        assert!(matches!(err, StoreError::DeleteFailure { id: 2, .. }));
        assert_eq!(ids(&store.list().await), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_snapshot() {
        let gateway = Arc::new(ScriptedGateway {
            next_id: Mutex::new(6),
            fail_fetch: Some(RemoteError::Service {
                status: 500,
                message: "down".into(),
            }),
            ..Default::default()
        });
        let store = IngredientStore::new(gateway);
        store.commit(Draft::new("Milk", "1")).await.unwrap();

        assert!(matches!(
            store.refresh().await,
            Err(StoreError::RefreshFailure(RemoteError::Service { status: 500, .. }))
        ));
        assert_eq!(ids(&store.list().await), vec![7]);
    }

    #[tokio::test]
    async fn test_refresh_drops_duplicate_ids() {
        let gateway = Arc::new(ScriptedGateway {
            listing: Mutex::new(vec![item(1, "first"), item(1, "again"), item(2, "b")]),
            ..Default::default()
        });
        let store = IngredientStore::new(gateway);

        let items = store.refresh().await.unwrap();
        assert_eq!(ids(&items), vec![1, 2]);
        assert_eq!(items[0].name, "first");
    }

    #[tokio::test]
    async fn test_events_follow_mutations() {
        let gateway = Arc::new(ScriptedGateway {
            next_id: Mutex::new(9),
            ..Default::default()
        });
        let store = IngredientStore::new(gateway);
        let mut rx = store.subscribe();

        store.commit(Draft::new("Milk", "1")).await.unwrap();
        store.delete(10).await.unwrap();
        store.refresh().await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), StoreEvent::Added { id: 10 });
        assert_eq!(rx.recv().await.unwrap(), StoreEvent::Removed { id: 10 });
        assert_eq!(rx.recv().await.unwrap(), StoreEvent::Refreshed { count: 0 });
    }
}
