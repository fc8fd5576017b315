//! Worklist construction: which domains to scan and where each report goes

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::domain::{ScanJob, ScopeType, validate_domain};
use crate::error::{Result, TkoError};
use crate::store::{DomainFilter, DomainStore};

/// What the user asked to scan
#[derive(Debug, Clone, Default)]
pub struct TargetRequest {
    /// Single domain passed on the command line
    pub domain: Option<String>,
    /// Pull active domains from the store
    pub import_from_store: bool,
    /// Include domains this tool has already processed
    pub rescan: bool,
    /// Output directory, relative to the project base path
    pub output_path: Option<String>,
}

pub struct TargetResolver<'a> {
    store: &'a dyn DomainStore,
    tool: &'a str,
    base_path: Option<&'a Path>,
}

impl<'a> TargetResolver<'a> {
    pub fn new(store: &'a dyn DomainStore, tool: &'a str, base_path: Option<&'a Path>) -> Self {
        Self {
            store,
            tool,
            base_path,
        }
    }

    /// Build the job list. Explicit domain first, then store order; each name
    /// appears once. Creates the output directory as a side effect.
    pub fn resolve(&self, request: &TargetRequest) -> Result<Vec<ScanJob>> {
        let base_path = self
            .base_path
            .ok_or_else(|| TkoError::config("project base path is not configured"))?;
        let output_path = request
            .output_path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| TkoError::config("output path is not set"))?;

        let mut candidates = Vec::new();

        if let Some(domain) = request.domain.as_deref().filter(|d| !d.trim().is_empty()) {
            candidates.push(validate_domain(domain)?);
        }

        if request.import_from_store {
            // Active scope only
            let mut filter = DomainFilter::scope(ScopeType::Active);
            if !request.rescan {
                filter = filter.unprocessed_by(self.tool);
            }
            let domains = self.store.list(&filter)?;
            debug!(count = domains.len(), rescan = request.rescan, "Imported domains from store");
            for domain in domains {
                match validate_domain(&domain.name) {
                    Ok(name) => candidates.push(name),
                    Err(e) => warn!("Skipping stored domain: {}", e),
                }
            }
        }

        let output_dir = resolve_output_dir(base_path, output_path);
        std::fs::create_dir_all(&output_dir).map_err(|source| TkoError::Io {
            path: output_dir.clone(),
            source,
        })?;

        let mut seen = HashSet::new();
        Ok(candidates
            .into_iter()
            .filter(|name| seen.insert(name.clone()))
            .map(|name| {
                let output = output_dir.join(&name);
                ScanJob::new(name, output)
            })
            .collect())
    }
}

/// Join `output_path` beneath `base_path`.
///
/// A leading separator does not make the path filesystem-absolute: `/scans`
/// under `/home/project` is `/home/project/scans`.
pub fn resolve_output_dir(base_path: &Path, output_path: &str) -> PathBuf {
    let relative = output_path.trim_start_matches(['/', std::path::MAIN_SEPARATOR]);
    base_path.join(relative)
}
