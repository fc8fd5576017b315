//! Parsing of tko-subs reports and merging of findings into the domain store

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::{HEADER_MARKER, ScanJob, ScopeType, TkoMeta, Verdict, classify, row_signature};
use crate::error::{Result, TkoError};
use crate::store::{DomainStore, update_tool_meta};

/// How a single report row was judged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Vulnerable,
    NotVulnerable,
    Ambiguous,
}

impl From<Verdict> for Classification {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Vulnerable => Classification::Vulnerable,
            Verdict::NotVulnerable => Classification::NotVulnerable,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassifiedRow {
    pub target: String,
    pub classification: Classification,
    pub provider: Option<String>,
    pub raw: String,
    /// Why the row could not be classified
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// A job whose report could not be read
#[derive(Debug, Clone, Serialize)]
pub struct JobFailure {
    pub target: String,
    pub error: String,
}

/// Outcome of processing a batch of reports
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessReport {
    pub rows: Vec<ClassifiedRow>,
    pub failed_jobs: Vec<JobFailure>,
    /// Domains whose metadata was written
    pub updated_domains: Vec<String>,
}

impl ProcessReport {
    pub fn count(&self, classification: Classification) -> usize {
        self.rows
            .iter()
            .filter(|r| r.classification == classification)
            .count()
    }

    pub fn vulnerable(&self) -> impl Iterator<Item = &ClassifiedRow> {
        self.rows
            .iter()
            .filter(|r| r.classification == Classification::Vulnerable)
    }

    pub fn summary(&self) -> String {
        format!(
            "{} vulnerable, {} not vulnerable, {} ambiguous ({} domains updated, {} failed jobs)",
            self.count(Classification::Vulnerable),
            self.count(Classification::NotVulnerable),
            self.count(Classification::Ambiguous),
            self.updated_domains.len(),
            self.failed_jobs.len()
        )
    }
}

/// Data rows of a report: header and blank lines dropped, duplicates removed.
///
/// Duplicates are detected on [`row_signature`]; the first occurrence is kept
/// with its original text and position.
pub fn extract_rows(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    content
        .split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty() && !line.contains(HEADER_MARKER))
        .filter(|line| seen.insert(row_signature(line)))
        .map(str::to_string)
        .collect()
}

pub struct ResultProcessor<'a> {
    store: &'a dyn DomainStore,
    tool: &'a str,
}

impl<'a> ResultProcessor<'a> {
    pub fn new(store: &'a dyn DomainStore, tool: &'a str) -> Self {
        Self { store, tool }
    }

    /// Process every job's report, then commit once.
    ///
    /// Unreadable reports are recorded and skipped. Store failures abort.
    pub fn process(&self, jobs: &[ScanJob]) -> Result<ProcessReport> {
        let mut report = ProcessReport::default();

        for job in jobs {
            match self.process_job(job, &mut report) {
                Ok(()) => {}
                Err(e) if e.is_recoverable() => {
                    warn!(domain = %job.target, "Skipping results: {}", e);
                    report.failed_jobs.push(JobFailure {
                        target: job.target.clone(),
                        error: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        self.store.commit()?;
        Ok(report)
    }

    fn process_job(&self, job: &ScanJob, report: &mut ProcessReport) -> Result<()> {
        let content =
            std::fs::read_to_string(&job.output_path).map_err(|source| TkoError::Io {
                path: job.output_path.clone(),
                source,
            })?;

        let rows = extract_rows(&content);
        if rows.is_empty() {
            debug!(domain = %job.target, "No results");
            return Ok(());
        }

        // The target was just probed, so it belongs in active scope if new
        let (created, _) = self.store.find_or_create(&job.target, ScopeType::Active)?;
        if created {
            debug!(domain = %job.target, "Added domain to store");
        }

        let mut vulnerable = Vec::new();
        for row in &rows {
            let (classification, provider, reason) = match classify(row) {
                Ok((finding, verdict)) => {
                    match verdict {
                        Verdict::NotVulnerable => warn!(
                            "Hosting found at {} for {}, not vulnerable.",
                            job.target, finding.provider
                        ),
                        Verdict::Vulnerable => {
                            info!(vulnerable = true, "{} vulnerable to {}!", job.target, finding.provider);
                            vulnerable.push(row.clone());
                        }
                    }
                    (Classification::from(verdict), Some(finding.provider), None)
                }
                Err(e) => {
                    warn!("Not sure of result: {} (report rows: {:?})", e, rows);
                    (Classification::Ambiguous, None, Some(e.to_string()))
                }
            };

            report.rows.push(ClassifiedRow {
                target: job.target.clone(),
                classification,
                provider,
                raw: row.clone(),
                reason,
            });
        }

        // Always written so the domain counts as processed, even with no hits
        update_tool_meta(self.store, &job.target, self.tool, |meta: &mut TkoMeta| {
            meta.vulnerable.extend(vulnerable);
        })?;
        report.updated_domains.push(job.target.clone());

        Ok(())
    }
}
