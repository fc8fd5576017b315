//! Rendering of the tko-subs invocation

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::domain::ScanJob;

/// Reference file tko-subs reads provider fingerprints from
pub const DEFAULT_DATA_FILE: &str = "providers-data.csv";

/// How to invoke the external binary
#[derive(Debug, Clone, Default)]
pub struct ToolSettings {
    pub binary: PathBuf,
    /// Appended verbatim, not sanitized
    pub extra_args: Option<String>,
    /// Defaults to [`DEFAULT_DATA_FILE`] next to the binary
    pub data_file: Option<PathBuf>,
}

impl ToolSettings {
    pub fn data_file(&self) -> PathBuf {
        self.data_file
            .clone()
            .unwrap_or_else(|| default_data_file(&self.binary))
    }
}

/// `providers-data.csv` in the directory holding `binary`
pub fn default_data_file(binary: &Path) -> PathBuf {
    binary
        .parent()
        .map(|dir| dir.join(DEFAULT_DATA_FILE))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE))
}

/// A fully rendered invocation:
/// `<binary> -domain <target> -output <output> [passthrough] -data <data_file>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolCommand {
    pub program: PathBuf,
    pub target: String,
    pub output: PathBuf,
    pub passthrough: Option<String>,
    pub data_file: PathBuf,
}

impl ToolCommand {
    /// Render for a job. Nothing is executed here.
    ///
    /// A `-data` inside the passthrough string does not suppress the trailing
    /// `-data`; which one wins is up to tko-subs' own flag parsing.
    pub fn build(job: &ScanJob, settings: &ToolSettings) -> Self {
        let passthrough = settings
            .extra_args
            .as_deref()
            .map(str::trim)
            .filter(|args| !args.is_empty())
            .map(str::to_string);

        Self {
            program: settings.binary.clone(),
            target: job.target.clone(),
            output: job.output_path.clone(),
            passthrough,
            data_file: settings.data_file(),
        }
    }

    /// Shell command line. Our own values are quoted where needed, the
    /// passthrough string is inserted as is.
    pub fn command_line(&self) -> String {
        let mut parts = vec![
            shell_quote(&self.program.to_string_lossy()),
            "-domain".to_string(),
            shell_quote(&self.target),
            "-output".to_string(),
            shell_quote(&self.output.to_string_lossy()),
        ];
        if let Some(extra) = &self.passthrough {
            parts.push(extra.clone());
        }
        parts.push("-data".to_string());
        parts.push(shell_quote(&self.data_file.to_string_lossy()));
        parts.join(" ")
    }
}

impl std::fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.command_line())
    }
}

fn is_shell_safe(value: &str) -> bool {
    !value.is_empty()
        && value.chars().all(|c| {
            c.is_ascii_alphanumeric()
                || matches!(c, '-' | '_' | '.' | '/' | ':' | '=' | '+' | ',')
                || (cfg!(windows) && c == '\\')
        })
}

/// POSIX single quotes for `sh -c`
#[cfg(not(windows))]
fn shell_quote(value: &str) -> String {
    if is_shell_safe(value) {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}

/// Double quotes for `cmd /C`; embedded quotes are doubled
#[cfg(windows)]
fn shell_quote(value: &str) -> String {
    if is_shell_safe(value) {
        value.to_string()
    } else {
        format!("\"{}\"", value.replace('"', "\"\""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> ScanJob {
        ScanJob::new("example.com", "/home/project/scans/example.com")
    }

    fn settings(binary: &str, extra: Option<&str>, data: Option<&str>) -> ToolSettings {
        ToolSettings {
            binary: PathBuf::from(binary),
            extra_args: extra.map(str::to_string),
            data_file: data.map(PathBuf::from),
        }
    }

    #[test]
    fn test_default_data_file_next_to_binary() {
        let cmd = ToolCommand::build(&job(), &settings("/opt/tko-subs", None, None));
        assert_eq!(cmd.data_file, PathBuf::from("/opt/providers-data.csv"));
        assert_eq!(
            cmd.command_line(),
            "/opt/tko-subs -domain example.com -output /home/project/scans/example.com -data /opt/providers-data.csv"
        );
    }

    #[test]
    fn test_bare_binary_name() {
        assert_eq!(
            default_data_file(Path::new("tko-subs")),
            PathBuf::from("providers-data.csv")
        );
    }

    #[test]
    fn test_explicit_data_file_and_passthrough() {
        let cmd = ToolCommand::build(
            &job(),
            &settings("/opt/tko-subs", Some("-threads 5 -takeover"), Some("/data/p.csv")),
        );
        assert_eq!(
            cmd.command_line(),
            "/opt/tko-subs -domain example.com -output /home/project/scans/example.com -threads 5 -takeover -data /data/p.csv"
        );
    }

    #[test]
    fn test_passthrough_data_flag_is_not_deduplicated() {
        let cmd = ToolCommand::build(
            &job(),
            &settings("/opt/tko-subs", Some("-data /other.csv"), None),
        );
        let line = cmd.command_line();
        assert_eq!(line.split_whitespace().filter(|t| *t == "-data").count(), 2);
        assert!(line.ends_with("-data /opt/providers-data.csv"));
    }

    #[test]
    fn test_blank_passthrough_is_ignored() {
        let cmd = ToolCommand::build(&job(), &settings("tko-subs", Some("   "), None));
        assert!(cmd.passthrough.is_none());
    }

    #[test]
    #[cfg(not(windows))]
    fn test_paths_with_spaces_are_quoted() {
        let job = ScanJob::new("example.com", "/home/my project/scans/example.com");
        let cmd = ToolCommand::build(&job, &settings("/opt/tko subs/tko-subs", None, None));
        assert_eq!(
            cmd.command_line(),
            "'/opt/tko subs/tko-subs' -domain example.com -output '/home/my project/scans/example.com' -data '/opt/tko subs/providers-data.csv'"
        );
    }

    #[test]
    #[cfg(windows)]
    fn test_paths_with_spaces_are_quoted_for_cmd() {
        let job = ScanJob::new("example.com", r"C:\scans dir\example.com");
        let cmd = ToolCommand::build(
            &job,
            &settings(
                r"C:\tools\tko-subs.exe",
                None,
                Some(r"C:\tools\providers-data.csv"),
            ),
        );
        assert_eq!(
            cmd.command_line(),
            r#"C:\tools\tko-subs.exe -domain example.com -output "C:\scans dir\example.com" -data C:\tools\providers-data.csv"#
        );
    }

    #[test]
    fn test_quotes_inside_values_are_escaped() {
        let job = ScanJob::new("example.com", "/scans/it's");
        let cmd = ToolCommand::build(&job, &settings("tko-subs", None, None));
        let expected = if cfg!(windows) {
            r#"-output "/scans/it's""#
        } else {
            r"-output '/scans/it'\''s'"
        };
        assert!(cmd.command_line().contains(expected));
    }
}
