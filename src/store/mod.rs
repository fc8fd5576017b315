//! Domain repository
//!
//! Domains are keyed by name and carry a JSON metadata object with one key per
//! tool. Writes to a tool's key go through [`DomainStore::update_meta`], which
//! reads, mutates and writes the object in a single transaction, so callers
//! never hold a mutable reference to stored state.
//!
//! ```text
//! domains
//!   name        "shop.example.com"
//!   scope_type  "active"
//!   meta_json   {"Tko-subs": {"vulnerable": ["shop.example.com,x.github.io,github,true"]},
//!                "Subfinder": {...}}
//! ```

mod db;
mod repository;

pub use db::DomainDb;
pub use repository::DomainRepository;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::{DomainRecord, ScopeType};
use crate::error::{Result, TkoError};

/// Callback handed the current value of a tool's metadata key (`Null` when absent)
pub type MetaMutator<'a> = &'a mut dyn FnMut(&mut Value) -> Result<()>;

/// Filter for [`DomainStore::list`]
#[derive(Debug, Clone, Default)]
pub struct DomainFilter {
    pub scope_type: Option<ScopeType>,
    /// Only domains without a metadata key for this tool
    pub unprocessed_by: Option<String>,
}

impl DomainFilter {
    pub fn scope(scope_type: ScopeType) -> Self {
        Self {
            scope_type: Some(scope_type),
            unprocessed_by: None,
        }
    }

    pub fn unprocessed_by(mut self, tool: impl Into<String>) -> Self {
        self.unprocessed_by = Some(tool.into());
        self
    }
}

/// Persistence for domains and their per-tool metadata
pub trait DomainStore: Send + Sync {
    /// Look up a domain, creating it with `scope_type` if missing.
    /// Returns `(created, record)`.
    fn find_or_create(&self, name: &str, scope_type: ScopeType) -> Result<(bool, DomainRecord)>;

    fn get(&self, name: &str) -> Result<Option<DomainRecord>>;

    /// List domains ordered by name
    fn list(&self, filter: &DomainFilter) -> Result<Vec<DomainRecord>>;

    /// Transactionally rewrite `meta[tool]` of an existing domain. Other tools'
    /// keys are untouched. If the mutator fails nothing is written.
    fn update_meta(&self, name: &str, tool: &str, mutator: MetaMutator<'_>) -> Result<()>;

    /// Make all completed writes durable
    fn commit(&self) -> Result<()>;
}

/// Typed wrapper around [`DomainStore::update_meta`].
///
/// The stored value is decoded into `T` (or `T::default()` when the key is
/// absent), passed to `f`, and encoded back.
pub fn update_tool_meta<T, F>(
    store: &dyn DomainStore,
    name: &str,
    tool: &str,
    f: F,
) -> Result<()>
where
    T: Serialize + DeserializeOwned + Default,
    F: FnOnce(&mut T),
{
    let mut f = Some(f);
    store.update_meta(name, tool, &mut |value| {
        let metadata_error = |source| TkoError::Metadata {
            domain: name.to_string(),
            source,
        };

        let mut typed: T = if value.is_null() {
            T::default()
        } else {
            serde_json::from_value(value.take()).map_err(metadata_error)?
        };
        if let Some(f) = f.take() {
            f(&mut typed);
        }
        *value = serde_json::to_value(&typed).map_err(metadata_error)?;
        Ok(())
    })
}
