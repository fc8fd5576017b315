//! Init command implementation

use anyhow::{Result, bail};
use std::path::Path;

use tkoscan::config::Config;

/// Default configuration content for tkoscan init
pub const DEFAULT_CONFIG: &str = r#"# tkoscan configuration
#
# [project]
#   base_path - directory scan output is written beneath (required for `run`)
#   database  - domain database (default: ~/.tkoscan/domains.db)
#
# [tool]
#   binary      - tko-subs executable
#   data        - providers-data.csv (default: next to the binary)
#   output_path - output directory relative to base_path; a leading "/" is
#                 still resolved beneath base_path
#   tool_args   - extra arguments appended to every tko-subs invocation

[project]
# base_path = "/home/me/engagement"

[tool]
binary = "tko-subs"
output_path = "tko-subs"
# data = "/opt/tko-subs/providers-data.csv"
# tool_args = "-threads 5"
"#;

pub fn init_command(config_path: Option<&Path>, force: bool) -> Result<()> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::global_config_path);

    if path.exists() && !force {
        bail!(
            "Config file already exists: {}\nUse --force to overwrite.",
            path.display()
        );
    }

    // Template must parse
    let config: Config = toml::from_str(DEFAULT_CONFIG)?;
    Config::write_atomic(&path, DEFAULT_CONFIG)?;

    println!("Created {}", path.display());
    println!("Database: {}", config.database_path().display());
    println!("\nSet project.base_path before running scans.");
    Ok(())
}
