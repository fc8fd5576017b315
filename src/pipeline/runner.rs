//! Execution of rendered commands

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::command::ToolCommand;
use crate::error::{Result, TkoError};

/// Exit information for one finished command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    /// `None` when the process was terminated by a signal
    pub code: Option<i32>,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs the scanner for one job and waits for it to exit
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, command: &ToolCommand) -> Result<RunOutcome>;
}

/// Runs commands through the system shell so passthrough arguments keep their
/// quoting. No timeout is applied.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner;

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(&self, command: &ToolCommand) -> Result<RunOutcome> {
        let line = command.command_line();
        debug!(command = %line, "Spawning scanner");

        let status = shell(&line)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|source| TkoError::Process {
                program: command.program.display().to_string(),
                source,
            })?;

        Ok(RunOutcome {
            code: status.code(),
        })
    }
}

#[cfg(not(windows))]
fn shell(line: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(line);
    cmd
}

#[cfg(windows)]
fn shell(line: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(line);
    cmd
}
