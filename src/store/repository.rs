//! SQLite implementation of the domain store

use rusqlite::{OptionalExtension, Row, params};
use serde_json::{Map, Value};

use super::db::DomainDb;
use super::{DomainFilter, DomainStore, MetaMutator};
use crate::domain::{DomainRecord, ScopeType, normalize_domain, validate_domain};
use crate::error::{Result, TkoError};

const SELECT_COLUMNS: &str = "SELECT name, scope_type, meta_json, created_at, updated_at FROM domains";

/// Repository for domain records
#[derive(Clone)]
pub struct DomainRepository {
    db: DomainDb,
}

/// Columns as read from SQLite, before metadata JSON is decoded
struct RawDomainRow {
    name: String,
    scope_type: String,
    meta_json: String,
    created_at: i64,
    updated_at: i64,
}

impl RawDomainRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            name: row.get(0)?,
            scope_type: row.get(1)?,
            meta_json: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }

    fn into_record(self) -> Result<DomainRecord> {
        let meta = decode_meta(&self.name, &self.meta_json)?;
        Ok(DomainRecord {
            scope_type: ScopeType::from_str(&self.scope_type).unwrap_or_default(),
            name: self.name,
            meta,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn decode_meta(domain: &str, raw: &str) -> Result<Map<String, Value>> {
    serde_json::from_str(raw).map_err(|source| TkoError::Metadata {
        domain: domain.to_string(),
        source,
    })
}

impl DomainRepository {
    pub fn new(db: DomainDb) -> Self {
        Self { db }
    }

    /// Open the repository backed by a specific database file
    pub fn open(path: &std::path::Path) -> Result<Self> {
        Ok(Self::new(DomainDb::open(path)?))
    }

    /// Change the scope of an existing domain. Returns false if it does not exist.
    pub fn set_scope(&self, name: &str, scope_type: ScopeType) -> Result<bool> {
        let conn = self.db.conn();
        let now = chrono::Utc::now().timestamp_millis();
        let changed = conn
            .execute(
                "UPDATE domains SET scope_type = ?2, updated_at = ?3 WHERE name = ?1",
                params![normalize_domain(name), scope_type.as_str(), now],
            )
            .map_err(TkoError::storage("set scope"))?;
        Ok(changed > 0)
    }

    /// Count all stored domains
    pub fn count(&self) -> Result<usize> {
        let conn = self.db.conn();
        conn.query_row("SELECT COUNT(*) FROM domains", [], |r| r.get::<_, i64>(0))
            .map(|n| n as usize)
            .map_err(TkoError::storage("count domains"))
    }
}

impl DomainStore for DomainRepository {
    fn find_or_create(&self, name: &str, scope_type: ScopeType) -> Result<(bool, DomainRecord)> {
        let name = validate_domain(name)?;

        let created = {
            let conn = self.db.conn();
            let now = chrono::Utc::now().timestamp_millis();
            let inserted = conn
                .execute(
                    r#"
                    INSERT OR IGNORE INTO domains (name, scope_type, meta_json, created_at, updated_at)
                    VALUES (?1, ?2, '{}', ?3, ?3)
                    "#,
                    params![name, scope_type.as_str(), now],
                )
                .map_err(TkoError::storage("find or create domain"))?;
            inserted > 0
        };

        let record = self.get(&name)?.ok_or(TkoError::Storage {
            op: "find or create domain",
            source: rusqlite::Error::QueryReturnedNoRows,
        })?;
        Ok((created, record))
    }

    fn get(&self, name: &str) -> Result<Option<DomainRecord>> {
        let raw = {
            let conn = self.db.conn();
            conn.query_row(
                &format!("{SELECT_COLUMNS} WHERE name = ?1"),
                params![normalize_domain(name)],
                RawDomainRow::from_row,
            )
            .optional()
            .map_err(TkoError::storage("get domain"))?
        };

        raw.map(RawDomainRow::into_record).transpose()
    }

    fn list(&self, filter: &DomainFilter) -> Result<Vec<DomainRecord>> {
        let rows = {
            let conn = self.db.conn();
            let mut stmt = conn
                .prepare(&format!(
                    "{SELECT_COLUMNS} WHERE (?1 IS NULL OR scope_type = ?1) ORDER BY name"
                ))
                .map_err(TkoError::storage("list domains"))?;

            stmt.query_map(
                params![filter.scope_type.map(|s| s.as_str())],
                RawDomainRow::from_row,
            )
            .map_err(TkoError::storage("list domains"))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(TkoError::storage("list domains"))?
        };

        let mut records = Vec::with_capacity(rows.len());
        for raw in rows {
            let record = raw.into_record()?;
            if let Some(tool) = filter.unprocessed_by.as_deref() {
                if record.is_processed_by(tool) {
                    continue;
                }
            }
            records.push(record);
        }
        Ok(records)
    }

    fn update_meta(&self, name: &str, tool: &str, mutator: MetaMutator<'_>) -> Result<()> {
        let name = normalize_domain(name);
        let mut conn = self.db.conn();
        let tx = conn
            .transaction()
            .map_err(TkoError::storage("update metadata"))?;

        let raw: String = tx
            .query_row(
                "SELECT meta_json FROM domains WHERE name = ?1",
                params![name],
                |r| r.get(0),
            )
            .map_err(TkoError::storage("update metadata"))?;

        let mut meta = decode_meta(&name, &raw)?;
        let mut value = meta.remove(tool).unwrap_or(Value::Null);
        mutator(&mut value)?;
        if value.is_null() {
            value = Value::Object(Map::new());
        }
        meta.insert(tool.to_string(), value);

        let encoded = serde_json::to_string(&meta).map_err(|source| TkoError::Metadata {
            domain: name.clone(),
            source,
        })?;
        let now = chrono::Utc::now().timestamp_millis();
        tx.execute(
            "UPDATE domains SET meta_json = ?2, updated_at = ?3 WHERE name = ?1",
            params![name, encoded, now],
        )
        .map_err(TkoError::storage("update metadata"))?;

        tx.commit().map_err(TkoError::storage("update metadata"))
    }

    fn commit(&self) -> Result<()> {
        self.db.checkpoint()
    }
}
