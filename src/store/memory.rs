//! In-memory document store.
//!
//! Reference backend used by the test suite and local development. Assigns
//! uuid document ids, keeps every collection as a plain row list, and fans a
//! complete snapshot out to matching subscribers synchronously after each
//! committed write (the local-echo consistency model of the hosted backend).
//!
//! The store keeps a journal of accepted writes so tests can assert exactly
//! which calls reached the backend, and supports injected write failures for
//! exercising error paths.

use super::{DocumentRow, DocumentStore, Fields, SnapshotFn, StoreError, Subscription, WriteAck};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum WriteKind {
    Insert,
    Patch,
    Delete,
}

/// Journal entry for one accepted write call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedWrite {
    pub kind: WriteKind,
    pub collection: String,
    /// Target document id; `None` for inserts (assigned by the store).
    pub id: Option<String>,
    /// Payload fields; `None` for deletes.
    pub fields: Option<Fields>,
}

struct Subscriber {
    id: u64,
    collection: String,
    owner_id: String,
    on_snapshot: SnapshotFn,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<String, Vec<DocumentRow>>,
    subscribers: Vec<Subscriber>,
    journal: Vec<RecordedWrite>,
    next_subscriber_id: u64,
    fail_writes: bool,
}

/// In-memory [`DocumentStore`] with live subscriptions.
#[derive(Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// When enabled, every write fails with [`StoreError::Unavailable`]
    /// without touching data or notifying subscribers.
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.lock().unwrap().fail_writes = fail;
    }

    /// Returns the write journal accumulated so far.
    pub fn recorded_writes(&self) -> Vec<RecordedWrite> {
        self.inner.lock().unwrap().journal.clone()
    }

    /// Number of writes that reached the store (accepted or not yet failed).
    pub fn write_count(&self) -> usize {
        self.inner.lock().unwrap().journal.len()
    }

    /// Current rows of a collection, unfiltered. Test helper.
    pub fn rows(&self, collection: &str) -> Vec<DocumentRow> {
        self.inner
            .lock()
            .unwrap()
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Seeds a document with a fixed id without notifying subscribers,
    /// mimicking data that already existed before the client connected.
    pub fn seed(&self, collection: &str, id: &str, fields: Fields) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(DocumentRow {
                id: id.to_string(),
                fields,
            });
    }

    fn owner_of(row: &DocumentRow) -> Option<&str> {
        match row.fields.get("ownerId") {
            Some(Value::String(owner)) => Some(owner.as_str()),
            _ => None,
        }
    }

    fn matching_rows(inner: &Inner, collection: &str, owner_id: &str) -> Vec<DocumentRow> {
        inner
            .collections
            .get(collection)
            .map(|rows| {
                rows.iter()
                    .filter(|row| Self::owner_of(row) == Some(owner_id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Collects the pending snapshot deliveries for a collection. Callbacks
    /// are invoked after the lock is released so they may re-enter the store.
    fn pending_notifications(inner: &Inner, collection: &str) -> Vec<(SnapshotFn, Vec<DocumentRow>)> {
        inner
            .subscribers
            .iter()
            .filter(|sub| sub.collection == collection)
            .map(|sub| {
                (
                    sub.on_snapshot.clone(),
                    Self::matching_rows(inner, collection, &sub.owner_id),
                )
            })
            .collect()
    }

    fn commit(&self, collection: &str, write: RecordedWrite) -> Result<(), StoreError> {
        let notifications = {
            let mut inner = self.inner.lock().unwrap();
            if inner.fail_writes {
                return Err(StoreError::Unavailable("injected write failure".to_string()));
            }
            inner.journal.push(write.clone());

            let rows = inner.collections.entry(collection.to_string()).or_default();
            match write.kind {
                WriteKind::Insert => {
                    rows.push(DocumentRow {
                        id: write.id.clone().unwrap_or_default(),
                        fields: write.fields.clone().unwrap_or_default(),
                    });
                }
                WriteKind::Patch => {
                    let id = write.id.as_deref().unwrap_or_default();
                    let row = rows
                        .iter_mut()
                        .find(|row| row.id == id)
                        .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
                    for (key, value) in write.fields.clone().unwrap_or_default() {
                        row.fields.insert(key, value);
                    }
                }
                WriteKind::Delete => {
                    let id = write.id.as_deref().unwrap_or_default();
                    rows.retain(|row| row.id != id);
                }
            }

            Self::pending_notifications(&inner, collection)
        };

        for (on_snapshot, rows) in notifications {
            on_snapshot(rows);
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn subscribe(&self, collection: &str, owner_id: &str, on_snapshot: SnapshotFn) -> Subscription {
        let (subscriber_id, initial) = {
            let mut inner = self.inner.lock().unwrap();
            let subscriber_id = inner.next_subscriber_id;
            inner.next_subscriber_id += 1;
            inner.subscribers.push(Subscriber {
                id: subscriber_id,
                collection: collection.to_string(),
                owner_id: owner_id.to_string(),
                on_snapshot: on_snapshot.clone(),
            });
            (
                subscriber_id,
                Self::matching_rows(&inner, collection, owner_id),
            )
        };

        // Initial delivery, like the hosted backend's first onSnapshot call.
        on_snapshot(initial);

        let inner = Arc::clone(&self.inner);
        Subscription::new(move || {
            inner
                .lock()
                .unwrap()
                .subscribers
                .retain(|sub| sub.id != subscriber_id);
        })
    }

    async fn insert(&self, collection: &str, fields: Fields) -> Result<WriteAck, StoreError> {
        let id = Uuid::new_v4().to_string();
        self.commit(
            collection,
            RecordedWrite {
                kind: WriteKind::Insert,
                collection: collection.to_string(),
                id: Some(id.clone()),
                fields: Some(fields),
            },
        )?;
        Ok(WriteAck { id })
    }

    async fn patch(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<WriteAck, StoreError> {
        self.commit(
            collection,
            RecordedWrite {
                kind: WriteKind::Patch,
                collection: collection.to_string(),
                id: Some(id.to_string()),
                fields: Some(fields),
            },
        )?;
        Ok(WriteAck { id: id.to_string() })
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<WriteAck, StoreError> {
        self.commit(
            collection,
            RecordedWrite {
                kind: WriteKind::Delete,
                collection: collection.to_string(),
                id: Some(id.to_string()),
                fields: None,
            },
        )?;
        Ok(WriteAck { id: id.to_string() })
    }
}
