//! Shared test utilities for pipeline integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tempfile::TempDir;

use tkoscan::pipeline::{ProcessRunner, RunOutcome, ToolCommand};
use tkoscan::store::DomainRepository;

pub const HEADER: &str = "Domain,Cname,Provider,IsVulnerable,IsTakenOver,Response";

/// Temp project directory with a fresh domain database inside
pub struct TestProject {
    pub dir: TempDir,
    pub repo: DomainRepository,
}

impl TestProject {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let repo = DomainRepository::open(&dir.path().join("domains.db"))
            .expect("Failed to open domain db");
        Self { dir, repo }
    }
}

/// Stands in for tko-subs: writes a canned report for each target it knows
/// and records every command it was given.
#[derive(Default)]
pub struct FakeRunner {
    reports: HashMap<String, String>,
    exit_codes: HashMap<String, i32>,
    pub calls: Mutex<Vec<ToolCommand>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_report(mut self, target: &str, content: &str) -> Self {
        self.reports.insert(target.to_string(), content.to_string());
        self
    }

    pub fn with_exit_code(mut self, target: &str, code: i32) -> Self {
        self.exit_codes.insert(target.to_string(), code);
        self
    }

    pub fn called_targets(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.target.clone())
            .collect()
    }
}

#[async_trait]
impl ProcessRunner for FakeRunner {
    async fn run(&self, command: &ToolCommand) -> tkoscan::error::Result<RunOutcome> {
        self.calls.lock().unwrap().push(command.clone());
        if let Some(content) = self.reports.get(&command.target) {
            std::fs::write(&command.output, content).expect("Failed to write fake report");
        }
        Ok(RunOutcome {
            code: Some(self.exit_codes.get(&command.target).copied().unwrap_or(0)),
        })
    }
}
