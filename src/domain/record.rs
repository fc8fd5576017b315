//! Domain record as kept by the domain store

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ScopeType;
use crate::error::{Result, TkoError};

/// A known domain and the metadata every tool has attached to it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainRecord {
    /// Fully qualified domain name, unique across the store
    pub name: String,
    /// Whether active probing is allowed
    pub scope_type: ScopeType,
    /// Tool name -> tool specific data
    pub meta: Map<String, Value>,
    /// Created timestamp (ms since epoch)
    pub created_at: i64,
    /// Updated timestamp (ms since epoch)
    pub updated_at: i64,
}

impl DomainRecord {
    /// Create a new record with empty metadata
    pub fn new(name: impl Into<String>, scope_type: ScopeType) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            name: name.into(),
            scope_type,
            meta: Map::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Metadata stored under a tool's namespace
    pub fn tool_meta(&self, tool: &str) -> Option<&Value> {
        self.meta.get(tool)
    }

    /// A domain counts as processed once the tool owns a key in its metadata,
    /// even if that key holds no findings.
    pub fn is_processed_by(&self, tool: &str) -> bool {
        self.meta.contains_key(tool)
    }
}

/// Canonical form used as the store key: trimmed, lower-case, no trailing dot
pub fn normalize_domain(name: &str) -> String {
    name.trim().trim_end_matches('.').to_lowercase()
}

/// Normalize `name` and check it is a plain hostname.
///
/// The name doubles as a file name under the output directory, so separators,
/// empty labels and `..` are rejected along with anything outside
/// `[a-z0-9_-]` per label.
pub fn validate_domain(name: &str) -> Result<String> {
    let normalized = normalize_domain(name);
    if normalized.is_empty() {
        return Err(TkoError::config("domain name must not be empty"));
    }

    let valid_label = |label: &str| {
        !label.is_empty()
            && label
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    };
    if !normalized.split('.').all(valid_label) {
        return Err(TkoError::config(format!(
            "invalid domain name: {}",
            name.trim()
        )));
    }
    Ok(normalized)
}
