//! SQLite implementation of RecordStore trait
//!
//! Each patient is one row holding the JSON document of the record.

use crate::error::{RecordError, Result};
use crate::records::{Category, RecordStore, UserRecord};
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS patients (
    user_id TEXT PRIMARY KEY,
    document TEXT NOT NULL
)";

/// SQLite implementation of RecordStore
pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

impl SqliteRecordStore {
    /// Open (or create) the database at `database_uri`. `:memory:` gives a
    /// private in-memory database.
    pub fn open(database_uri: &str) -> Result<Self> {
        let conn = if database_uri == ":memory:" {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = Path::new(database_uri).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        RecordError::Persistence(format!(
                            "Failed to create database directory {}: {}",
                            parent.display(),
                            e
                        ))
                    })?;
                }
            }
            Connection::open(database_uri)?
        };
        conn.execute(CREATE_TABLE, [])?;
        info!("Opened SQLite record store at {}", database_uri);
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| RecordError::Persistence("record store connection poisoned".to_string()))
    }
}

fn load_document(conn: &Connection, user_id: &str) -> Result<Option<UserRecord>> {
    let document: Option<String> = conn
        .query_row(
            "SELECT document FROM patients WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )
        .optional()?;

    match document {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

impl RecordStore for SqliteRecordStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn find(&self, user_id: &str) -> Result<Option<UserRecord>> {
        let conn = self.lock()?;
        load_document(&conn, user_id)
    }

    fn insert(&self, record: &UserRecord) -> Result<bool> {
        let document = serde_json::to_string(record)?;
        let conn = self.lock()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO patients (user_id, document) VALUES (?1, ?2)",
            params![record.user_id, document],
        )?;
        debug!("Insert for user {} affected {} row(s)", record.user_id, inserted);
        Ok(inserted == 1)
    }

    fn append_file(&self, user_id: &str, category: Category, url: &str) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let mut record = load_document(&tx, user_id)?.ok_or(RecordError::NotFound)?;
        record.push_file(category, url);

        let document = serde_json::to_string(&record)?;
        tx.execute(
            "UPDATE patients SET document = ?1 WHERE user_id = ?2",
            params![document, user_id],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn exists(&self, user_id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM patients WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}
