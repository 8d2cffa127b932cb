//! Document store seam.
//!
//! The sync layer talks to the backend through [`DocumentStore`]: live
//! owner-scoped query subscriptions plus single-document writes over
//! schemaless JSON field maps. Documents carry store-assigned ids; every
//! write is an independent single-document operation (no transactions).

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

pub mod memory;

/// Schemaless field map of a single document, keyed by camelCase field names.
pub type Fields = Map<String, Value>;

/// One document as delivered in a snapshot: the store-assigned id plus fields.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRow {
    pub id: String,
    pub fields: Fields,
}

/// Acknowledgment of a committed write.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteAck {
    /// Id of the document the write landed on.
    pub id: String,
}

/// Errors surfaced by the store backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Permission denied on collection '{0}'")]
    PermissionDenied(String),
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("Store backend unavailable: {0}")]
    Unavailable(String),
}

/// Snapshot callback: receives the complete set of currently-matching rows.
pub type SnapshotFn = Arc<dyn Fn(Vec<DocumentRow>) + Send + Sync>;

/// Handle for a live subscription. Cancelling (or dropping) unregisters the
/// callback; the store guarantees no further snapshot delivery after that.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// Narrow interface to the remote document database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Opens a live query scoped to `ownerId == owner_id`. The callback is
    /// invoked with the full matching set immediately and again after every
    /// change, until the returned handle is cancelled.
    fn subscribe(&self, collection: &str, owner_id: &str, on_snapshot: SnapshotFn) -> Subscription;

    /// Creates a new document; the store assigns the id.
    async fn insert(&self, collection: &str, fields: Fields) -> Result<WriteAck, StoreError>;

    /// Merges `fields` into an existing document. Fields absent from the map
    /// are left untouched on the remote document.
    async fn patch(&self, collection: &str, id: &str, fields: Fields)
        -> Result<WriteAck, StoreError>;

    /// Deletes a single document.
    async fn delete(&self, collection: &str, id: &str) -> Result<WriteAck, StoreError>;
}

/// Serializes a payload struct into a document field map.
///
/// Payload types serialize to JSON objects by construction; anything else is
/// a programming error, logged and mapped to an empty map rather than
/// propagated (writes never throw past their call site).
pub fn to_fields<T: Serialize>(payload: &T) -> Fields {
    match serde_json::to_value(payload) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            tracing::error!(target: "system", "Payload serialized to non-object value: {}", other);
            Fields::new()
        }
        Err(e) => {
            tracing::error!(target: "system", error = %e, "Failed to serialize write payload");
            Fields::new()
        }
    }
}
