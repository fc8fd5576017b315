//! SQLite database connection and schema management for the domain store
//!
//! Manages the `domains.db` database with automatic schema migration.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::error::{Result, TkoError};

/// Database wrapper for domain records
#[derive(Clone)]
pub struct DomainDb {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl DomainDb {
    /// Open or create the database at a specific path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| TkoError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path).map_err(TkoError::storage("open database"))?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(TkoError::storage("configure database"))?;
        conn.pragma_update(None, "synchronous", "NORMAL")
            .map_err(TkoError::storage("configure database"))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Get a reference to the connection
    pub fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().expect("Domain DB lock poisoned")
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute_batch(SCHEMA_SQL)
            .map_err(TkoError::storage("initialize schema"))?;
        drop(conn);
        self.run_migrations()
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn();

        let version: i32 = conn
            .query_row(
                "SELECT COALESCE(MAX(version), 0) FROM schema_version",
                [],
                |r| r.get(0),
            )
            .map_err(TkoError::storage("read schema version"))?;

        if version < 1 {
            return Err(TkoError::config(format!(
                "unsupported domain database schema version {version}"
            )));
        }

        Ok(())
    }

    /// Flush the write-ahead log into the main database file
    pub fn checkpoint(&self) -> Result<()> {
        let conn = self.conn();
        conn.query_row("PRAGMA wal_checkpoint(PASSIVE)", [], |_| Ok(()))
            .map_err(TkoError::storage("commit"))
    }
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY);
INSERT OR IGNORE INTO schema_version VALUES (1);

CREATE TABLE IF NOT EXISTS domains (
    name TEXT PRIMARY KEY,                  -- lower-case FQDN, no trailing dot
    scope_type TEXT NOT NULL DEFAULT 'passive',
    meta_json TEXT NOT NULL DEFAULT '{}',   -- tool name -> tool data
    created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now') * 1000),
    updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now') * 1000)
);
CREATE INDEX IF NOT EXISTS idx_domains_scope ON domains(scope_type);
"#;
