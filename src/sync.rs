//! Generic collection synchronizer.
//!
//! One `CollectionSync` instance mirrors an owner-scoped subset of a remote
//! collection into a local cache and mediates every write. The cache is fully
//! replaced on each snapshot push, sorted by creation time descending; it is
//! never patched incrementally and never updated optimistically on writes.
//!
//! Write operations check the active principal and entity ownership before
//! touching the store. Failures of any kind are logged and reported through
//! the returned `Result`, never escalated: callers that ignore the result get
//! the original fire-and-forget behavior.

use crate::shared::errors::{DropReason, WriteError};
use crate::store::{DocumentRow, DocumentStore, Fields, Subscription, WriteAck};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

/// An entity kind mirrored from one remote collection.
pub trait Collection: Clone + serde::de::DeserializeOwned + Send + Sync + 'static {
    /// Remote collection name.
    const NAME: &'static str;

    fn id(&self) -> &str;
    fn owner_id(&self) -> &str;
    fn created_at(&self) -> DateTime<Utc>;

    /// Decodes one snapshot row. Malformed documents are skipped with a
    /// warning rather than poisoning the whole snapshot.
    fn decode(row: &DocumentRow) -> Option<Self> {
        let mut object = row.fields.clone();
        object.insert("id".to_string(), Value::String(row.id.clone()));
        match serde_json::from_value(Value::Object(object)) {
            Ok(entity) => Some(entity),
            Err(e) => {
                tracing::warn!(
                    target: "system",
                    collection = Self::NAME,
                    id = %row.id,
                    error = %e,
                    "Skipping malformed document in snapshot"
                );
                None
            }
        }
    }
}

struct AttachState {
    principal: Option<String>,
    subscription: Option<Subscription>,
}

/// Mirrors one principal-scoped remote collection and mediates its writes.
pub struct CollectionSync<T: Collection> {
    store: Arc<dyn DocumentStore>,
    cache: Arc<RwLock<Vec<T>>>,
    state: Mutex<AttachState>,
    /// Bumped on every attach/detach; snapshot callbacks carry the value they
    /// were created under and skip the cache once it moves on. This keeps a
    /// late delivery from a torn-down subscription out of the cache.
    generation: Arc<AtomicU64>,
}

impl<T: Collection> CollectionSync<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            cache: Arc::new(RwLock::new(Vec::new())),
            state: Mutex::new(AttachState {
                principal: None,
                subscription: None,
            }),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Current cache contents, newest first.
    pub fn snapshot(&self) -> Vec<T> {
        self.cache.read().unwrap().clone()
    }

    /// Looks up a cached entity by id.
    pub fn get(&self, id: &str) -> Option<T> {
        self.cache
            .read()
            .unwrap()
            .iter()
            .find(|entity| entity.id() == id)
            .cloned()
    }

    /// Principal the synchronizer is currently attached for.
    pub fn active_principal(&self) -> Option<String> {
        self.state.lock().unwrap().principal.clone()
    }

    /// Points the synchronizer at a principal.
    ///
    /// Re-attaching for the principal that already has a live subscription is
    /// a no-op. Otherwise any existing subscription is torn down first, so at
    /// most one subscription is live at a time. Attaching with `None` clears
    /// the cache and opens no subscription.
    pub fn attach(&self, principal: Option<&str>) {
        let mut state = self.state.lock().unwrap();

        if state.principal.as_deref() == principal
            && (principal.is_none() || state.subscription.is_some())
        {
            return;
        }

        if let Some(subscription) = state.subscription.take() {
            subscription.cancel();
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
        state.principal = principal.map(|p| p.to_string());

        let principal = match principal {
            Some(principal) => principal,
            None => {
                self.cache.write().unwrap().clear();
                return;
            }
        };

        let cache = Arc::clone(&self.cache);
        let generation = Arc::clone(&self.generation);
        let expected = generation.load(Ordering::SeqCst);
        let subscription = self.store.subscribe(
            T::NAME,
            principal,
            Arc::new(move |rows: Vec<DocumentRow>| {
                if generation.load(Ordering::SeqCst) != expected {
                    return;
                }
                let mut entities: Vec<T> = rows.iter().filter_map(T::decode).collect();
                entities.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
                *cache.write().unwrap() = entities;
            }),
        );
        state.subscription = Some(subscription);

        tracing::info!(
            target: "system",
            collection = T::NAME,
            "Subscription attached"
        );
    }

    /// Cancels the active subscription. After this returns, no snapshot can
    /// mutate the cache until the next `attach`.
    pub fn detach(&self) {
        let mut state = self.state.lock().unwrap();
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(subscription) = state.subscription.take() {
            subscription.cancel();
            tracing::info!(
                target: "system",
                collection = T::NAME,
                "Subscription detached"
            );
        }
    }

    /// Submits a new document stamped with the active principal and the
    /// current time. The cache is not touched; the entity appears on the next
    /// snapshot push.
    pub async fn create(&self, draft: Fields) -> Result<WriteAck, WriteError> {
        let principal = match self.active_principal() {
            Some(principal) => principal,
            None => {
                tracing::warn!(target: "system", collection = T::NAME, "Create dropped: no signed-in user");
                return Err(DropReason::NoPrincipal.into());
            }
        };

        let mut fields = draft;
        fields.insert("ownerId".to_string(), Value::String(principal));
        fields.insert(
            "createdAt".to_string(),
            Value::from(Utc::now().timestamp_millis()),
        );

        match self.store.insert(T::NAME, fields).await {
            Ok(ack) => Ok(ack),
            Err(e) => {
                tracing::error!(target: "system", collection = T::NAME, error = %e, "Create failed");
                Err(e.into())
            }
        }
    }

    /// Merges `fields` into a cached, owned document. Unknown ids and
    /// entities owned by another principal are dropped without a store call.
    pub async fn update(&self, id: &str, fields: Fields) -> Result<WriteAck, WriteError> {
        self.check_ownership(id, "Update")?;
        match self.store.patch(T::NAME, id, fields).await {
            Ok(ack) => Ok(ack),
            Err(e) => {
                tracing::error!(target: "system", collection = T::NAME, id, error = %e, "Update failed");
                Err(e.into())
            }
        }
    }

    /// Deletes a cached, owned document. Same ownership discipline as
    /// `update`.
    pub async fn remove(&self, id: &str) -> Result<WriteAck, WriteError> {
        self.check_ownership(id, "Delete")?;
        match self.store.delete(T::NAME, id).await {
            Ok(ack) => Ok(ack),
            Err(e) => {
                tracing::error!(target: "system", collection = T::NAME, id, error = %e, "Delete failed");
                Err(e.into())
            }
        }
    }

    fn check_ownership(&self, id: &str, operation: &str) -> Result<(), WriteError> {
        let principal = match self.active_principal() {
            Some(principal) => principal,
            None => {
                tracing::warn!(
                    target: "system",
                    collection = T::NAME,
                    id,
                    "{} dropped: no signed-in user",
                    operation
                );
                return Err(DropReason::NoPrincipal.into());
            }
        };

        let owned = self
            .cache
            .read()
            .unwrap()
            .iter()
            .any(|entity| entity.id() == id && entity.owner_id() == principal);

        if !owned {
            tracing::warn!(
                target: "system",
                collection = T::NAME,
                id,
                "{} dropped: entity not in cache or not owned by the active user",
                operation
            );
            return Err(DropReason::NotOwned.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Clone, Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Item {
        id: String,
        title: String,
        owner_id: String,
        #[serde(with = "chrono::serde::ts_milliseconds")]
        created_at: DateTime<Utc>,
    }

    impl Collection for Item {
        const NAME: &'static str = "items";

        fn id(&self) -> &str {
            &self.id
        }
        fn owner_id(&self) -> &str {
            &self.owner_id
        }
        fn created_at(&self) -> DateTime<Utc> {
            self.created_at
        }
    }

    fn seed(store: &MemoryStore, id: &str, owner: &str, title: &str, created_at: i64) {
        let fields = match json!({ "ownerId": owner, "title": title, "createdAt": created_at }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        store.seed("items", id, fields);
    }

    fn draft(title: &str) -> Fields {
        match json!({ "title": title }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_attach_populates_cache_newest_first() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, "a", "u1", "older", 1_000);
        seed(&store, "b", "u1", "newer", 2_000);

        let sync: CollectionSync<Item> = CollectionSync::new(store);
        sync.attach(Some("u1"));

        let cache = sync.snapshot();
        assert_eq!(cache.len(), 2);
        assert_eq!(cache[0].id, "b");
        assert_eq!(cache[1].id, "a");
    }

    #[tokio::test]
    async fn test_attach_none_clears_cache() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, "a", "u1", "x", 1);

        let sync: CollectionSync<Item> = CollectionSync::new(store);
        sync.attach(Some("u1"));
        assert_eq!(sync.snapshot().len(), 1);

        sync.attach(None);
        assert!(sync.snapshot().is_empty());
        assert_eq!(sync.active_principal(), None);
    }

    #[tokio::test]
    async fn test_attach_same_principal_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, "a", "u1", "x", 1);

        let sync: CollectionSync<Item> = CollectionSync::new(Arc::clone(&store) as Arc<dyn DocumentStore>);
        sync.attach(Some("u1"));
        sync.attach(Some("u1"));

        // A second live subscription would double-deliver; mutate and check
        // the cache still holds exactly the store rows.
        store.insert("items", {
            let mut fields = draft("y");
            fields.insert("ownerId".to_string(), Value::String("u1".to_string()));
            fields.insert("createdAt".to_string(), Value::from(2));
            fields
        })
        .await
        .unwrap();
        assert_eq!(sync.snapshot().len(), 2);
    }

    #[tokio::test]
    async fn test_detach_stops_cache_mutation() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, "a", "u1", "x", 1);

        let sync: CollectionSync<Item> = CollectionSync::new(Arc::clone(&store) as Arc<dyn DocumentStore>);
        sync.attach(Some("u1"));
        sync.detach();

        store.insert("items", {
            let mut fields = draft("y");
            fields.insert("ownerId".to_string(), Value::String("u1".to_string()));
            fields.insert("createdAt".to_string(), Value::from(2));
            fields
        })
        .await
        .unwrap();

        assert_eq!(sync.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn test_create_stamps_owner_and_created_at() {
        let store = Arc::new(MemoryStore::new());
        let sync: CollectionSync<Item> = CollectionSync::new(Arc::clone(&store) as Arc<dyn DocumentStore>);
        sync.attach(Some("u1"));

        sync.create(draft("hello")).await.unwrap();

        let rows = store.rows("items");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].fields["ownerId"], "u1");
        assert!(rows[0].fields["createdAt"].is_i64());
    }

    #[tokio::test]
    async fn test_create_without_principal_is_dropped() {
        let store = Arc::new(MemoryStore::new());
        let sync: CollectionSync<Item> = CollectionSync::new(Arc::clone(&store) as Arc<dyn DocumentStore>);

        let err = sync.create(draft("hello")).await.unwrap_err();
        assert_eq!(err, WriteError::Dropped(DropReason::NoPrincipal));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_update_foreign_entity_is_dropped_without_store_call() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, "a", "u1", "theirs", 1);

        // Attached as u2; u1's rows never enter the cache, so the ownership
        // check fails on the cache lookup.
        let sync: CollectionSync<Item> = CollectionSync::new(Arc::clone(&store) as Arc<dyn DocumentStore>);
        sync.attach(Some("u2"));

        let err = sync.update("a", draft("mine now")).await.unwrap_err();
        assert_eq!(err, WriteError::Dropped(DropReason::NotOwned));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_is_reported_not_thrown() {
        let store = Arc::new(MemoryStore::new());
        let sync: CollectionSync<Item> = CollectionSync::new(Arc::clone(&store) as Arc<dyn DocumentStore>);
        sync.attach(Some("u1"));
        store.set_fail_writes(true);

        let err = sync.create(draft("x")).await.unwrap_err();
        assert!(matches!(err, WriteError::Store(_)));
        // Cache untouched; nothing to roll back because nothing was applied.
        assert!(sync.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_replaces_instead_of_merging() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, "a", "u1", "first", 1);
        seed(&store, "b", "u1", "second", 2);

        let sync: CollectionSync<Item> = CollectionSync::new(Arc::clone(&store) as Arc<dyn DocumentStore>);
        sync.attach(Some("u1"));
        assert_eq!(sync.snapshot().len(), 2);

        store.delete("items", "a").await.unwrap();

        let cache = sync.snapshot();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache[0].id, "b");
    }

    #[tokio::test]
    async fn test_malformed_rows_are_skipped() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, "good", "u1", "ok", 1);
        let broken = match json!({ "ownerId": "u1", "createdAt": "not-a-timestamp" }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        store.seed("items", "bad", broken);

        let sync: CollectionSync<Item> = CollectionSync::new(store);
        sync.attach(Some("u1"));

        let cache = sync.snapshot();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache[0].id, "good");
    }
}
