//! Scan pipeline
//!
//! ```text
//! TargetResolver ──► ToolCommand::build ──► ProcessRunner ──► ResultProcessor ──► DomainStore::commit
//!   (jobs)            (one per job)          (sequential)      (parse, classify,
//!                                                               merge metadata)
//! ```
//!
//! Jobs run one after another; every command is awaited before the next one
//! starts and reports are processed once all commands have finished.

pub mod command;
pub mod results;
pub mod runner;
pub mod targets;

pub use command::{DEFAULT_DATA_FILE, ToolCommand, ToolSettings, default_data_file};
pub use results::{Classification, ClassifiedRow, JobFailure, ProcessReport, ResultProcessor, extract_rows};
pub use runner::{ProcessRunner, RunOutcome, SystemRunner};
pub use targets::{TargetRequest, TargetResolver, resolve_output_dir};

use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::{ScanJob, TOOL_NAME};
use crate::error::{Result, TkoError};
use crate::store::DomainStore;

/// Everything needed for one run
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub targets: TargetRequest,
    pub tool: ToolSettings,
    /// Render and log commands without executing or processing anything
    pub dry_run: bool,
}

/// A command that exited unsuccessfully
#[derive(Debug, Clone, Serialize)]
pub struct FailedCommand {
    pub target: String,
    pub exit_code: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub jobs: Vec<ScanJob>,
    pub commands: Vec<ToolCommand>,
    pub dry_run: bool,
    pub failed_commands: Vec<FailedCommand>,
    pub report: ProcessReport,
}

pub struct Pipeline<'a> {
    store: &'a dyn DomainStore,
    runner: &'a dyn ProcessRunner,
    base_path: Option<PathBuf>,
    tool: &'a str,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        store: &'a dyn DomainStore,
        runner: &'a dyn ProcessRunner,
        base_path: Option<PathBuf>,
    ) -> Self {
        Self {
            store,
            runner,
            base_path,
            tool: TOOL_NAME,
        }
    }

    /// Resolve jobs and render their commands without running anything
    pub fn plan(&self, request: &RunRequest) -> Result<Vec<(ScanJob, ToolCommand)>> {
        let resolver = TargetResolver::new(self.store, self.tool, self.base_path.as_deref());
        let jobs = resolver.resolve(&request.targets)?;
        Ok(jobs
            .into_iter()
            .map(|job| {
                let command = ToolCommand::build(&job, &request.tool);
                (job, command)
            })
            .collect())
    }

    pub async fn run(&self, request: &RunRequest) -> Result<RunSummary> {
        let planned = self.plan(request)?;
        let mut summary = RunSummary {
            dry_run: request.dry_run,
            ..RunSummary::default()
        };

        if planned.is_empty() {
            warn!("No targets to scan");
            return Ok(summary);
        }
        info!("Scanning {} target(s)", planned.len());

        for (job, command) in planned {
            if request.dry_run {
                info!("{}", command);
            } else {
                info!(domain = %job.target, "Running tko-subs");
                remove_stale_report(&job)?;
                let outcome = self.runner.run(&command).await?;
                if !outcome.is_success() {
                    warn!(
                        domain = %job.target,
                        exit_code = ?outcome.code,
                        "tko-subs exited unsuccessfully"
                    );
                    summary.failed_commands.push(FailedCommand {
                        target: job.target.clone(),
                        exit_code: outcome.code,
                    });
                }
            }
            summary.jobs.push(job);
            summary.commands.push(command);
        }

        if !request.dry_run {
            // Reports from failed commands are still read; partial output is kept
            let processor = ResultProcessor::new(self.store, self.tool);
            summary.report = processor.process(&summary.jobs)?;
            info!("{}", summary.report.summary());
        }

        Ok(summary)
    }
}

/// Drop a report left by an earlier run so a scanner that writes nothing is
/// not credited with old findings.
fn remove_stale_report(job: &ScanJob) -> Result<()> {
    match std::fs::remove_file(&job.output_path) {
        Ok(()) => {
            debug!(domain = %job.target, "Removed previous report");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(TkoError::Io {
            path: job.output_path.clone(),
            source,
        }),
    }
}
