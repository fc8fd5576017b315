//! Configuration loading and management

mod io;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Project paths
    #[serde(default)]
    pub project: ProjectConfig,

    /// External scanner settings
    #[serde(default)]
    pub tool: ToolConfig,
}

/// Project level paths
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Directory all scan output is written beneath
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_path: Option<PathBuf>,

    /// Domain database (defaults to ~/.tkoscan/domains.db)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,
}

/// Settings for the tko-subs binary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Path to (or name of) the tko-subs executable
    #[serde(default = "default_binary")]
    pub binary: PathBuf,

    /// providers-data.csv location; defaults to the binary's directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<PathBuf>,

    /// Output directory, relative to `project.base_path`
    #[serde(default = "default_output_path")]
    pub output_path: String,

    /// Extra arguments appended to every invocation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_args: Option<String>,
}

fn default_binary() -> PathBuf {
    PathBuf::from("tko-subs")
}

fn default_output_path() -> String {
    "tko-subs".to_string()
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            data: None,
            output_path: default_output_path(),
            tool_args: None,
        }
    }
}

impl Config {
    /// Database path, falling back to the global config directory
    pub fn database_path(&self) -> PathBuf {
        self.project
            .database
            .clone()
            .unwrap_or_else(|| Self::global_config_dir().join("domains.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let config: Config = toml::from_str(
            r#"
            [project]
            base_path = "/home/project"
            "#,
        )
        .unwrap();

        assert_eq!(config.project.base_path, Some(PathBuf::from("/home/project")));
        assert_eq!(config.tool.binary, PathBuf::from("tko-subs"));
        assert_eq!(config.tool.output_path, "tko-subs");
        assert!(config.tool.data.is_none());
    }

    #[test]
    fn test_parse_full_tool_section() {
        let config: Config = toml::from_str(
            r#"
            [project]
            base_path = "/srv/engagement"
            database = "/srv/engagement/domains.db"

            [tool]
            binary = "/opt/tko-subs"
            data = "/opt/data/providers-data.csv"
            output_path = "/scans"
            tool_args = "-threads 5"
            "#,
        )
        .unwrap();

        assert_eq!(config.database_path(), PathBuf::from("/srv/engagement/domains.db"));
        assert_eq!(config.tool.binary, PathBuf::from("/opt/tko-subs"));
        assert_eq!(config.tool.output_path, "/scans");
        assert_eq!(config.tool.tool_args.as_deref(), Some("-threads 5"));
    }

    #[test]
    fn test_default_database_under_global_dir() {
        let config = Config::default();
        assert!(config.database_path().ends_with(".tkoscan/domains.db"));
    }
}
