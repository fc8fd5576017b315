//! Run command implementation

use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};

use tkoscan::config::Config;
use tkoscan::pipeline::{
    Pipeline, RunRequest, RunSummary, SystemRunner, TargetRequest, ToolSettings,
};
use tkoscan::store::DomainRepository;

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Path to the providers-data.csv file
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Domain to run the tool against
    #[arg(short, long)]
    pub domain: Option<String>,

    /// Import subdomains from the database
    #[arg(short, long)]
    pub importdb: bool,

    /// Rescan already processed entries
    #[arg(long)]
    pub rescan: bool,

    /// Output directory, relative to the project base path
    #[arg(long)]
    pub output_path: Option<String>,

    /// Extra arguments appended verbatim to the tko-subs command
    #[arg(long, allow_hyphen_values = true)]
    pub tool_args: Option<String>,

    /// Path to the tko-subs binary
    #[arg(long)]
    pub binary: Option<PathBuf>,

    /// Project base path (overrides config)
    #[arg(long)]
    pub base_path: Option<PathBuf>,

    /// Print the commands without running them
    #[arg(long)]
    pub dry_run: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// Merge CLI flags over config values
fn build_request(config: &Config, args: &RunArgs) -> RunRequest {
    RunRequest {
        targets: TargetRequest {
            domain: args.domain.clone(),
            import_from_store: args.importdb,
            rescan: args.rescan,
            output_path: Some(
                args.output_path
                    .clone()
                    .unwrap_or_else(|| config.tool.output_path.clone()),
            ),
        },
        tool: ToolSettings {
            binary: args
                .binary
                .clone()
                .unwrap_or_else(|| config.tool.binary.clone()),
            extra_args: args.tool_args.clone().or_else(|| config.tool.tool_args.clone()),
            data_file: args.data.clone().or_else(|| config.tool.data.clone()),
        },
        dry_run: args.dry_run,
    }
}

pub async fn run_command(config_path: Option<&Path>, args: RunArgs) -> Result<()> {
    let config = Config::load(config_path)?;
    let request = build_request(&config, &args);
    let base_path = args.base_path.clone().or_else(|| config.project.base_path.clone());

    let db_path = config.database_path();
    let store = DomainRepository::open(&db_path)
        .with_context(|| format!("Failed to open domain database: {}", db_path.display()))?;
    let runner = SystemRunner;

    let pipeline = Pipeline::new(&store, &runner, base_path);
    let summary = pipeline.run(&request).await.context("Scan failed")?;

    print_summary(&summary, args.json)
}

fn print_summary(summary: &RunSummary, json_output: bool) -> Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    if summary.dry_run {
        for command in &summary.commands {
            println!("{}", command);
        }
        return Ok(());
    }

    if summary.jobs.is_empty() {
        println!("No targets to scan.");
        return Ok(());
    }

    println!("Scanned {} target(s): {}", summary.jobs.len(), summary.report.summary());

    let vulnerable: Vec<_> = summary.report.vulnerable().collect();
    if !vulnerable.is_empty() {
        println!("\nVulnerable:");
        for row in vulnerable {
            println!(
                "  {} -> {}",
                row.target,
                row.provider.as_deref().unwrap_or("-")
            );
        }
    }

    if !summary.failed_commands.is_empty() {
        println!("\nCommands that exited with errors:");
        for failed in &summary.failed_commands {
            let code = failed
                .exit_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            println!("  {} (exit {})", failed.target, code);
        }
    }

    if !summary.report.failed_jobs.is_empty() {
        println!("\nUnreadable reports:");
        for failure in &summary.report.failed_jobs {
            println!("  {}: {}", failure.target, failure.error);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: RunArgs,
    }

    fn parse(argv: &[&str]) -> RunArgs {
        TestCli::parse_from(std::iter::once("tkoscan").chain(argv.iter().copied())).args
    }

    #[test]
    fn test_flags_override_config() {
        let mut config = Config::default();
        config.tool.binary = PathBuf::from("/opt/tko-subs");
        config.tool.tool_args = Some("-threads 2".into());

        let args = parse(&[
            "-d",
            "example.com",
            "-i",
            "--rescan",
            "--tool-args",
            "-threads 8",
            "--output-path",
            "/scans",
        ]);
        let request = build_request(&config, &args);

        assert_eq!(request.targets.domain.as_deref(), Some("example.com"));
        assert!(request.targets.import_from_store);
        assert!(request.targets.rescan);
        assert_eq!(request.targets.output_path.as_deref(), Some("/scans"));
        assert_eq!(request.tool.binary, PathBuf::from("/opt/tko-subs"));
        assert_eq!(request.tool.extra_args.as_deref(), Some("-threads 8"));
        assert!(request.tool.data_file.is_none());
    }

    #[test]
    fn test_config_fills_missing_flags() {
        let mut config = Config::default();
        config.tool.data = Some(PathBuf::from("/data/providers-data.csv"));
        config.tool.tool_args = Some("-threads 2".into());

        let request = build_request(&config, &parse(&["--domain", "example.com"]));
        assert_eq!(request.targets.output_path.as_deref(), Some("tko-subs"));
        assert_eq!(request.tool.extra_args.as_deref(), Some("-threads 2"));
        assert_eq!(
            request.tool.data_file,
            Some(PathBuf::from("/data/providers-data.csv"))
        );
        assert!(!request.dry_run);
    }
}
