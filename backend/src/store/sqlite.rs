//! SQLite store: one `documents` table, namespaced by database name.

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use super::{check_name, DocumentStore};
use crate::error::StoreResult;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    database   TEXT NOT NULL,
    collection TEXT NOT NULL,
    key        TEXT NOT NULL,
    body       TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (database, collection, key)
);
"#;

pub struct SqliteStore {
    conn: Connection,
    path: PathBuf,
    database: String,
}

impl SqliteStore {
    /// Open (and create) the database file at `path`.
    pub fn open(path: &Path, database: &str) -> StoreResult<Self> {
        check_name("database", database)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn,
            path: path.to_path_buf(),
            database: database.to_string(),
        })
    }

    /// Store backed by a private in-memory database.
    pub fn open_in_memory(database: &str) -> StoreResult<Self> {
        check_name("database", database)?;
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn,
            path: PathBuf::from(":memory:"),
            database: database.to_string(),
        })
    }
}

impl DocumentStore for SqliteStore {
    fn replace_document(&mut self, collection: &str, key: &str, document: &Value) -> StoreResult<()> {
        check_name("collection", collection)?;
        check_name("key", key)?;
        let body = serde_json::to_string(document)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO documents (database, collection, key, body, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                self.database,
                collection,
                key,
                body,
                chrono::Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    fn get_document(&self, collection: &str, key: &str) -> StoreResult<Option<Value>> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM documents WHERE database = ?1 AND collection = ?2 AND key = ?3",
                params![self.database, collection, key],
                |row| row.get(0),
            )
            .optional()?;
        match body {
            Some(body) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    fn drop_collection(&mut self, collection: &str) -> StoreResult<()> {
        self.conn.execute(
            "DELETE FROM documents WHERE database = ?1 AND collection = ?2",
            params![self.database, collection],
        )?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("sqlite:{}#{}", self.path.display(), self.database)
    }
}
