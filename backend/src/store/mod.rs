//! Document store for rejected rows and result trees.
//!
//! A store holds JSON documents addressed by `(collection, key)` inside one
//! logical database. Each run writes two documents keyed by transform name:
//!
//! | Collection | Body                         |
//! |------------|------------------------------|
//! | `rejected` | [`RejectedBatch`] for the run |
//! | `results`  | [`ResultTree`] for the run    |
//!
//! Writes replace any earlier document under the same key, so re-running a
//! transform leaves exactly one current result.

pub mod directory;
pub mod memory;
pub mod sqlite;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::config::{StoreConfig, StoreKind};
use crate::error::{StoreError, StoreResult};
use crate::transform::RunOutcome;

pub use directory::DirectoryStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Collection receiving rejected rows.
pub const REJECTED_COLLECTION: &str = "rejected";

/// Collection receiving result trees.
pub const RESULTS_COLLECTION: &str = "results";

/// A keyed JSON document store.
pub trait DocumentStore {
    /// Insert `document` under `key`, replacing any existing one.
    fn replace_document(&mut self, collection: &str, key: &str, document: &Value) -> StoreResult<()>;

    fn get_document(&self, collection: &str, key: &str) -> StoreResult<Option<Value>>;

    /// Remove every document of `collection`. Missing collections are fine.
    fn drop_collection(&mut self, collection: &str) -> StoreResult<()>;

    /// Human-readable target, for logs.
    fn describe(&self) -> String;
}

/// Envelope wrapped around every stored body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredDocument {
    pub run_id: Uuid,
    pub transform: String,
    pub created_at: DateTime<Utc>,
    pub body: Value,
}

/// Reject collection or key names that could escape the store namespace.
pub(crate) fn check_name(kind: &str, name: &str) -> StoreResult<()> {
    let bad = name.is_empty()
        || name.starts_with('.')
        || name.contains(|c: char| c == '/' || c == '\\' || c == '\0');
    if bad {
        return Err(StoreError::InvalidTarget(format!(
            "invalid {} name '{}'",
            kind, name
        )));
    }
    Ok(())
}

/// Open the store described by `config`.
pub fn open_store(config: &StoreConfig) -> StoreResult<Box<dyn DocumentStore>> {
    let store: Box<dyn DocumentStore> = match config.kind {
        StoreKind::Memory => Box::new(MemoryStore::new()),
        StoreKind::Directory => Box::new(DirectoryStore::open(&config.path, &config.database)?),
        StoreKind::Sqlite => Box::new(SqliteStore::open(&config.path, &config.database)?),
    };
    info!(store = %store.describe(), "Document store opened");
    Ok(store)
}

/// Write the rejected batch and the result tree of a run.
///
/// Both documents share one run id, which is returned.
pub fn persist_run(store: &mut dyn DocumentStore, outcome: &RunOutcome) -> StoreResult<Uuid> {
    let run_id = Uuid::new_v4();
    let created_at = Utc::now();
    let transform = outcome.summary.transform.as_str();

    let envelope = |body: Value| StoredDocument {
        run_id,
        transform: transform.to_string(),
        created_at,
        body,
    };

    let rejected = serde_json::to_value(envelope(serde_json::to_value(&outcome.rejected)?))?;
    store.replace_document(REJECTED_COLLECTION, transform, &rejected)?;

    let results = serde_json::to_value(envelope(serde_json::to_value(&outcome.tree)?))?;
    store.replace_document(RESULTS_COLLECTION, transform, &results)?;

    info!(
        run_id = %run_id,
        transform,
        rejected = outcome.rejected.len(),
        store = %store.describe(),
        "Run persisted"
    );
    Ok(run_id)
}

/// Read back a stored document envelope.
pub fn load_document(
    store: &dyn DocumentStore,
    collection: &str,
    transform: &str,
) -> StoreResult<Option<StoredDocument>> {
    match store.get_document(collection, transform)? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}
