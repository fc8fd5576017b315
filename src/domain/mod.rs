//! Core domain types for tkoscan

mod finding;
mod job;
mod record;
mod scope;

pub use finding::{Finding, HEADER_MARKER, TkoMeta, Verdict, classify, row_signature};
pub use job::ScanJob;
pub use record::{DomainRecord, normalize_domain, validate_domain};
pub use scope::ScopeType;

/// Metadata namespace owned by this tool
pub const TOOL_NAME: &str = "Tko-subs";
