//! tkoscan - subdomain takeover checks over a domain repository
//!
//! tkoscan drives the external `tko-subs` scanner. It builds a worklist from a
//! single domain and/or the active domains in the repository, runs the scanner
//! once per domain, reads each CSV report and records vulnerable CNAMEs under
//! the `Tko-subs` key of the domain's metadata.
//!
//! ## Pieces
//!
//! - [`store`]: SQLite domain repository with per-tool JSON metadata
//! - [`pipeline`]: target resolution, command rendering, execution, result processing
//! - [`config`]: `~/.tkoscan/config.toml`

pub mod config;
pub mod domain;
pub mod error;
pub mod pipeline;
pub mod store;

pub use domain::*;
pub use error::TkoError;
