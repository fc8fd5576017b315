//! CLI commands for seeding and inspecting the domain database

use anyhow::{Context, Result, anyhow, bail};
use clap::Subcommand;
use std::path::{Path, PathBuf};

use tkoscan::config::Config;
use tkoscan::store::{DomainFilter, DomainRepository, DomainStore};
use tkoscan::{DomainRecord, ScopeType, TOOL_NAME, TkoMeta, validate_domain};

#[derive(Debug, Subcommand)]
pub enum DomainsCommand {
    /// Add domains (or change the scope of existing ones)
    Add {
        /// Domain names
        names: Vec<String>,

        /// Read additional names from a file, one per line
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Scope: active or passive
        #[arg(long, default_value = "active")]
        scope: String,
    },

    /// List domains
    List {
        /// Only show domains with this scope
        #[arg(long)]
        scope: Option<String>,

        /// Only show domains tko-subs has not processed yet
        #[arg(long)]
        unprocessed: bool,

        #[arg(long)]
        json: bool,
    },

    /// Show a domain and its stored results
    Show {
        name: String,

        #[arg(long)]
        json: bool,
    },
}

fn parse_scope(raw: &str) -> Result<ScopeType> {
    ScopeType::from_str(raw).ok_or_else(|| anyhow!("Unknown scope: {} (use active or passive)", raw))
}

/// Names from the command line and an optional file; blank lines and `#` comments skipped.
/// Names that are not plain hostnames are reported and dropped.
fn collect_names(names: Vec<String>, file: Option<&Path>) -> Result<Vec<String>> {
    let mut all = names;
    if let Some(path) = file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read domain list: {}", path.display()))?;
        all.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#'))
                .map(str::to_string),
        );
    }
    Ok(all
        .into_iter()
        .filter(|n| !n.trim().is_empty())
        .filter_map(|n| match validate_domain(&n) {
            Ok(name) => Some(name),
            Err(e) => {
                eprintln!("Warning: {}", e);
                None
            }
        })
        .collect())
}

pub fn domains_command(config_path: Option<&Path>, command: DomainsCommand) -> Result<()> {
    let config = Config::load(config_path)?;
    let db_path = config.database_path();
    let repo = DomainRepository::open(&db_path)
        .with_context(|| format!("Failed to open domain database: {}", db_path.display()))?;

    match command {
        DomainsCommand::Add { names, file, scope } => add(&repo, names, file.as_deref(), &scope),
        DomainsCommand::List {
            scope,
            unprocessed,
            json,
        } => list(&repo, scope.as_deref(), unprocessed, json),
        DomainsCommand::Show { name, json } => show(&repo, &name, json),
    }
}

fn add(repo: &DomainRepository, names: Vec<String>, file: Option<&Path>, scope: &str) -> Result<()> {
    let scope = parse_scope(scope)?;
    let names = collect_names(names, file)?;
    if names.is_empty() {
        bail!("No domains given. Pass names or --file <path>");
    }

    let mut created = 0;
    let mut updated = 0;
    for name in &names {
        let (is_new, record) = repo.find_or_create(name, scope)?;
        if is_new {
            created += 1;
        } else if record.scope_type != scope {
            repo.set_scope(name, scope)?;
            updated += 1;
        }
    }
    repo.commit()?;

    println!(
        "Added {} domain(s), rescoped {} ({} total in database)",
        created,
        updated,
        repo.count()?
    );
    Ok(())
}

fn list(repo: &DomainRepository, scope: Option<&str>, unprocessed: bool, json: bool) -> Result<()> {
    let mut filter = DomainFilter {
        scope_type: scope.map(parse_scope).transpose()?,
        unprocessed_by: None,
    };
    if unprocessed {
        filter = filter.unprocessed_by(TOOL_NAME);
    }
    let domains = repo.list(&filter)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&domains)?);
        return Ok(());
    }

    if domains.is_empty() {
        println!("No domains found.");
        return Ok(());
    }

    println!("Domains ({}):\n", domains.len());
    for domain in &domains {
        println!("  {:<8} {}{}", domain.scope_type, domain.name, status_suffix(domain));
    }
    Ok(())
}

fn status_suffix(domain: &DomainRecord) -> String {
    let Some(value) = domain.tool_meta(TOOL_NAME) else {
        return String::new();
    };
    let vulnerable = serde_json::from_value::<TkoMeta>(value.clone())
        .map(|m| m.vulnerable.len())
        .unwrap_or(0);
    if vulnerable > 0 {
        format!("  [{} vulnerable]", vulnerable)
    } else {
        "  [scanned]".to_string()
    }
}

fn show(repo: &DomainRepository, name: &str, json: bool) -> Result<()> {
    let domain = repo
        .get(name)?
        .ok_or_else(|| anyhow!("Domain not found: {}", name))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&domain)?);
        return Ok(());
    }

    println!("Domain: {}", domain.name);
    println!("Scope: {}", domain.scope_type);

    match domain.tool_meta(TOOL_NAME) {
        None => println!("{}: not scanned", TOOL_NAME),
        Some(value) => {
            let meta: TkoMeta = serde_json::from_value(value.clone())
                .with_context(|| format!("Unexpected {} metadata for {}", TOOL_NAME, domain.name))?;
            if meta.vulnerable.is_empty() {
                println!("{}: no vulnerable records", TOOL_NAME);
            } else {
                println!("{}: {} vulnerable record(s)", TOOL_NAME, meta.vulnerable.len());
                for row in &meta.vulnerable {
                    println!("  {}", row);
                }
            }
        }
    }

    let other_tools: Vec<_> = domain.meta.keys().filter(|k| *k != TOOL_NAME).collect();
    if !other_tools.is_empty() {
        println!(
            "Other tools: {}",
            other_tools
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    Ok(())
}
