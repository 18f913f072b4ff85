//! In-process store. Nothing survives the process.

use serde_json::Value;
use std::collections::BTreeMap;

use super::{check_name, DocumentStore};
use crate::error::StoreResult;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: BTreeMap<String, BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in `collection`.
    pub fn count(&self, collection: &str) -> usize {
        self.collections.get(collection).map_or(0, BTreeMap::len)
    }
}

impl DocumentStore for MemoryStore {
    fn replace_document(&mut self, collection: &str, key: &str, document: &Value) -> StoreResult<()> {
        check_name("collection", collection)?;
        check_name("key", key)?;
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(key.to_string(), document.clone());
        Ok(())
    }

    fn get_document(&self, collection: &str, key: &str) -> StoreResult<Option<Value>> {
        Ok(self
            .collections
            .get(collection)
            .and_then(|docs| docs.get(key))
            .cloned())
    }

    fn drop_collection(&mut self, collection: &str) -> StoreResult<()> {
        self.collections.remove(collection);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
