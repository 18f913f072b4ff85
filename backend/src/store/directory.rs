//! Filesystem store: `<root>/<database>/<collection>/<key>.json`.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use super::{check_name, DocumentStore};
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Open (and create) the database directory under `path`.
    pub fn open(path: &Path, database: &str) -> StoreResult<Self> {
        check_name("database", database)?;
        let root = path.join(database);
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, collection: &str, key: &str) -> StoreResult<PathBuf> {
        check_name("collection", collection)?;
        check_name("key", key)?;
        Ok(self.root.join(collection).join(format!("{}.json", key)))
    }
}

impl DocumentStore for DirectoryStore {
    fn replace_document(&mut self, collection: &str, key: &str, document: &Value) -> StoreResult<()> {
        let path = self.document_path(collection, key)?;
        let dir = path
            .parent()
            .ok_or_else(|| StoreError::InvalidTarget(path.display().to_string()))?;
        fs::create_dir_all(dir)?;

        // Write next to the target, then rename over it.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(document)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn get_document(&self, collection: &str, key: &str) -> StoreResult<Option<Value>> {
        let path = self.document_path(collection, key)?;
        if !path.is_file() {
            return Ok(None);
        }
        let content = fs::read(&path)?;
        Ok(Some(serde_json::from_slice(&content)?))
    }

    fn drop_collection(&mut self, collection: &str) -> StoreResult<()> {
        check_name("collection", collection)?;
        let dir = self.root.join(collection);
        if dir.is_dir() {
            fs::remove_dir_all(dir)?;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("directory:{}", self.root.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_layout_and_replace() {
        let dir = tempdir().unwrap();
        let mut store = DirectoryStore::open(dir.path(), "sales").unwrap();
        store.replace_document("results", "summary", &json!({"v": 1})).unwrap();
        store.replace_document("results", "summary", &json!({"v": 2})).unwrap();

        let file = dir.path().join("sales").join("results").join("summary.json");
        assert!(file.is_file());
        assert!(!file.with_extension("json.tmp").exists());
        assert_eq!(store.get_document("results", "summary").unwrap(), Some(json!({"v": 2})));
    }

    #[test]
    fn test_missing_document() {
        let dir = tempdir().unwrap();
        let store = DirectoryStore::open(dir.path(), "sales").unwrap();
        assert_eq!(store.get_document("results", "nothing").unwrap(), None);
    }

    #[test]
    fn test_drop_collection() {
        let dir = tempdir().unwrap();
        let mut store = DirectoryStore::open(dir.path(), "sales").unwrap();
        store.replace_document("rejected", "t", &json!({})).unwrap();
        store.drop_collection("rejected").unwrap();
        assert!(!store.root().join("rejected").exists());
        store.drop_collection("rejected").unwrap();
    }

    #[test]
    fn test_rejects_escaping_keys() {
        let dir = tempdir().unwrap();
        let mut store = DirectoryStore::open(dir.path(), "sales").unwrap();
        let err = store.replace_document("results", "../../etc", &json!({})).unwrap_err();
        assert!(matches!(err, StoreError::InvalidTarget(_)));
    }

    #[test]
    fn test_unusable_root() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        let err = DirectoryStore::open(&blocker, "sales").unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
    }
}
