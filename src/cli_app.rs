//! Top-level CLI definition and dispatch.

use std::collections::BTreeSet;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use colored::{Colorize, control};
use serde_json::json;
use thiserror::Error;

use rootsweep::core::config::Config;
use rootsweep::core::errors::RswError;
use rootsweep::logger::audit::{AuditLog, spawn_audit_logger};
use rootsweep::registry::RootRegistry;
use rootsweep::scanner::deletion::DeletionEngine;
use rootsweep::scanner::scan::{ScanResult, TreeScanner};
use rootsweep::scanner::selection::SelectionModel;
use rootsweep::scanner::size::format_size;
use rootsweep::store::fs::FsStore;
use rootsweep::store::{FileNode, Root};

/// rootsweep — scan granted roots and reclaim space from their heaviest entries.
#[derive(Debug, Parser)]
#[command(
    name = "rsw",
    author,
    version,
    about = "rootsweep - scan granted folders and delete the heavy entries",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Manage the granted root directories.
    Roots(RootsArgs),
    /// Scan all granted roots and rank top-level entries by size.
    Scan(ScanArgs),
    /// Delete entries by their scan index.
    Delete(DeleteArgs),
    /// Show the tail of the audit log.
    Log(LogArgs),
    /// Print the effective configuration.
    Config(ConfigArgs),
}

#[derive(Debug, Clone, Args)]
struct RootsArgs {
    #[command(subcommand)]
    action: RootsAction,
}

#[derive(Debug, Clone, Subcommand)]
enum RootsAction {
    /// Grant access to a directory.
    Add {
        /// Directory to grant.
        path: PathBuf,
    },
    /// Revoke a previously granted directory.
    Remove {
        /// Directory to revoke (as shown by `roots list`).
        path: PathBuf,
    },
    /// List granted directories in grant order.
    List,
}

#[derive(Debug, Clone, Args)]
struct ScanArgs {
    /// Only show the N largest entries.
    #[arg(long, value_name = "N")]
    top: Option<usize>,
}

#[derive(Debug, Clone, Args)]
struct DeleteArgs {
    /// Scan indices to delete, as printed by `rsw scan`.
    #[arg(required = true, value_name = "INDEX")]
    indices: Vec<usize>,
    /// Skip the confirmation prompt.
    #[arg(short, long)]
    yes: bool,
}

#[derive(Debug, Clone, Args)]
struct LogArgs {
    /// Number of trailing records to show.
    #[arg(short = 'n', long, default_value_t = 20)]
    lines: usize,
}

#[derive(Debug, Clone, Args)]
struct ConfigArgs {}

/// CLI-level failures, wrapping engine errors where they surface.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Engine(#[from] RswError),
    #[error("{0}")]
    Message(String),
}

/// Dispatch the parsed command line.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color || !io::stdout().is_terminal() {
        control::set_override(false);
    }

    let config = Config::load(cli.config.as_deref())?;
    match &cli.command {
        Command::Roots(args) => run_roots(cli, &config, args),
        Command::Scan(args) => run_scan(cli, &config, args),
        Command::Delete(args) => run_delete(cli, &config, args),
        Command::Log(args) => run_log(cli, &config, args),
        Command::Config(_) => run_config(cli, &config),
    }
}

fn run_roots(cli: &Cli, config: &Config, args: &RootsArgs) -> Result<(), CliError> {
    let registry = RootRegistry::open(&config.paths.roots_file)?;
    match &args.action {
        RootsAction::Add { path } => {
            if !path.is_dir() {
                return Err(CliError::Message(format!(
                    "not a directory: {}",
                    path.display()
                )));
            }
            let root = registry.add_root(path)?;
            if cli.json {
                println!("{}", json!({ "granted": root.location() }));
            } else {
                println!("Granted: {}", root.location().green());
            }
        }
        RootsAction::Remove { path } => {
            let normalized = rootsweep::core::paths::resolve_absolute_path(path);
            let root = Root::new(normalized.to_string_lossy());
            registry.remove_root(&root)?;
            if cli.json {
                println!("{}", json!({ "revoked": root.location() }));
            } else {
                println!("Revoked: {}", root.location());
            }
        }
        RootsAction::List => {
            let roots = registry.list_roots();
            if cli.json {
                let locations: Vec<&str> = roots.iter().map(Root::location).collect();
                println!("{}", json!({ "roots": locations }));
            } else if roots.is_empty() {
                println!("No roots granted. Use `rsw roots add <dir>` first.");
            } else {
                for root in &roots {
                    println!("{root}");
                }
            }
        }
    }
    Ok(())
}

fn run_scan(cli: &Cli, config: &Config, args: &ScanArgs) -> Result<(), CliError> {
    let result = scan_current(config)?;
    let shown = args.top.unwrap_or(usize::MAX);

    if cli.json {
        let entries: Vec<_> = result
            .entries()
            .iter()
            .take(shown)
            .enumerate()
            .map(|(i, e)| {
                json!({
                    "index": i,
                    "name": e.name,
                    "size_bytes": e.size_bytes,
                })
            })
            .collect();
        println!(
            "{}",
            json!({ "version": result.version(), "entries": entries })
        );
        return Ok(());
    }

    if result.is_empty() {
        println!("Nothing found. Grant roots with `rsw roots add <dir>`, then rescan.");
        return Ok(());
    }
    for (i, entry) in result.entries().iter().take(shown).enumerate() {
        println!(
            "{:>4}  {:>10}  {}",
            i,
            format_size(entry.size_bytes).bold(),
            entry.name.as_deref().unwrap_or("unknown")
        );
    }
    println!("Scan complete: {} items", result.entries().len());
    Ok(())
}

fn run_delete(cli: &Cli, config: &Config, args: &DeleteArgs) -> Result<(), CliError> {
    let result = scan_current(config)?;
    let entries = select_indices(&result, &args.indices)?;

    // Advisory only: sizes are not re-validated at delete time.
    let summary = DeletionEngine::summarize(&entries);
    if !cli.json {
        println!(
            "About to delete {}.",
            summary.headline().red().bold()
        );
        for name in &summary.top_names {
            println!("  {name}");
        }
        if summary.item_count > summary.top_names.len() {
            println!("  …and {} more", summary.item_count - summary.top_names.len());
        }
    }
    if !args.yes && !confirm("Proceed? This cannot be undone.")? {
        println!("Cancelled.");
        return Ok(());
    }

    let audit = AuditLog::new(
        &config.paths.audit_log,
        config.paths.mirror_log.clone(),
    );
    let (audit_handle, audit_join) = spawn_audit_logger(audit)?;
    let engine = DeletionEngine::new(Some(audit_handle.clone()));
    let outcome = engine.delete_all(&entries);
    audit_handle.record(outcome.summary_line());
    audit_handle.shutdown();
    let _ = audit_join.join();

    if cli.json {
        let failures: Vec<_> = outcome
            .failures
            .iter()
            .map(|f| json!({ "name": f.name, "error": f.error }))
            .collect();
        println!(
            "{}",
            json!({
                "deleted": outcome.deleted,
                "failed": outcome.failed,
                "failures": failures,
            })
        );
    } else {
        println!("Deleted {}, failed {}", outcome.deleted, outcome.failed);
        for failure in &outcome.failures {
            println!(
                "  {} {}: {}",
                "failed".red(),
                failure.name.as_deref().unwrap_or("unknown"),
                failure.error
            );
        }
    }
    Ok(())
}

fn run_log(cli: &Cli, config: &Config, args: &LogArgs) -> Result<(), CliError> {
    let raw = std::fs::read_to_string(&config.paths.audit_log).unwrap_or_default();
    let lines: Vec<&str> = raw.lines().collect();
    let start = lines.len().saturating_sub(args.lines);

    if cli.json {
        println!("{}", json!({ "records": &lines[start..] }));
    } else if lines.is_empty() {
        println!("Audit log is empty.");
    } else {
        for line in &lines[start..] {
            println!("{line}");
        }
    }
    Ok(())
}

fn run_config(cli: &Cli, config: &Config) -> Result<(), CliError> {
    let hash = config.stable_hash()?;
    if cli.json {
        let value = serde_json::to_value(config).map_err(RswError::from)?;
        println!("{}", json!({ "config": value, "hash": hash }));
    } else {
        let rendered = toml::to_string_pretty(config).map_err(|e| {
            CliError::Message(format!("failed to render config: {e}"))
        })?;
        print!("{rendered}");
        println!("# hash: {hash}");
    }
    Ok(())
}

/// Resolve user-supplied scan indices to nodes.
///
/// Repeating an index means the same item, not a toggle-off, so indices
/// are deduplicated before selection.
fn select_indices(
    result: &ScanResult,
    indices: &[usize],
) -> Result<Vec<Arc<dyn FileNode>>, CliError> {
    let mut selection = SelectionModel::new();
    let unique: BTreeSet<usize> = indices.iter().copied().collect();
    for index in unique {
        if index >= result.entries().len() {
            return Err(CliError::Message(format!(
                "index {index} out of range (scan found {} items)",
                result.entries().len()
            )));
        }
        selection.toggle(result, index);
    }
    let entries: Vec<_> = selection
        .selected_entries(result)
        .into_iter()
        .map(|e| e.node)
        .collect();
    if entries.is_empty() {
        return Err(CliError::Message("no items selected".to_string()));
    }
    Ok(entries)
}

/// Fresh scan over every granted root.
fn scan_current(config: &Config) -> Result<ScanResult, CliError> {
    let registry = RootRegistry::open(&config.paths.roots_file)?;
    let roots = registry.list_roots();
    let scanner = TreeScanner::new(FsStore, config.scan.parallelism);
    scanner
        .scan(&roots)
        .completed()
        .ok_or_else(|| CliError::Message("scan was cancelled".to_string()))
}

fn confirm(prompt: &str) -> Result<bool, CliError> {
    print!("{prompt} [y/N] ");
    io::stdout()
        .flush()
        .map_err(|e| CliError::Message(e.to_string()))?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| CliError::Message(e.to_string()))?;
    let answer = line.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}
