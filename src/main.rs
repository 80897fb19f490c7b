//! cleanslate - find files that are plausibly safe to delete.
//!
//! Usage:
//!   cleanslate scan [PATH]       Rank files by how deletable they look
//!   cleanslate trash PATH...     Move files to the trash and learn from it
//!   cleanslate keep PATH...      Mark files as worth keeping
//!   cleanslate stats             Show what has been learned per extension
//!   cleanslate reset --yes       Forget everything learned
//!   cleanslate --help            Show help

mod export;
mod settings;

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, bail};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cleanslate_analyze::{DuplicateGroup, collect_groups, format_age};
use cleanslate_core::{ExtStat, FileRecord, ResultFilter};
use cleanslate_learn::LearningStore;
use cleanslate_ops::SystemTrash;
use cleanslate_session::{ScanReport, Session, keep_and_learn, trash_and_learn};

use crate::settings::Settings;

#[derive(Parser)]
#[command(
    name = "cleanslate",
    version,
    about = "Find files that are plausibly safe to delete",
    long_about = "cleanslate ranks files by size, age and what you have deleted or \
                  kept before, and groups exact duplicates.\n\n\
                  Files are only ever moved to the trash, never deleted outright."
)]
struct Cli {
    /// Learning database (defaults to the platform data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a directory and list deletion suggestions
    Scan {
        /// Directory to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Only files with an identical copy
        #[arg(long)]
        only_duplicates: bool,

        /// Only files at or past the old-file threshold
        #[arg(long)]
        only_old: bool,

        /// Only files at or past the large-file threshold
        #[arg(long)]
        only_large: bool,

        /// Only zero-byte files
        #[arg(long)]
        only_empty: bool,

        /// Only files scoring at least this much
        #[arg(long, allow_negative_numbers = true)]
        min_score: Option<i64>,

        /// Number of suggestions to show (csv exports every match)
        #[arg(short = 'n', long, default_value = "20")]
        top: usize,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Move files to the trash and learn a delete for each
    Trash {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Learn a keep for each file
    Keep {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Show learned statistics per extension
    Stats {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Erase all learned data
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    init_logging();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;
    debug!(?settings, "Loaded settings");
    let store = Arc::new(open_store(cli.db.as_deref())?);

    match cli.command {
        Command::Scan {
            path,
            only_duplicates,
            only_old,
            only_large,
            only_empty,
            min_score,
            top,
            format,
        } => {
            let filter = ResultFilter::new()
                .with_only_duplicates(only_duplicates)
                .with_only_old(only_old)
                .with_only_large(only_large)
                .with_only_empty(only_empty)
                .with_min_score(min_score);
            run_scan(store, settings, &path, &filter, top, format)?;
        }
        Command::Trash { paths } => run_trash(&store, &paths)?,
        Command::Keep { paths } => run_keep(&store, &paths)?,
        Command::Stats { format } => run_stats(&store, format)?,
        Command::Reset { yes } => {
            if !yes {
                bail!("Refusing to erase learned data without --yes");
            }
            store.reset().context("Reset failed")?;
            eprintln!("Learned data erased");
        }
    }

    Ok(())
}

/// Log to stderr, filtered by `CLEANSLATE_LOG` (default `warn`).
fn init_logging() {
    let filter =
        EnvFilter::try_from_env("CLEANSLATE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn open_store(db: Option<&Path>) -> Result<LearningStore> {
    let path = match db {
        Some(path) => path.to_path_buf(),
        None => LearningStore::default_path()?,
    };
    LearningStore::open(&path)
        .wrap_err_with(|| format!("Failed to open learning database {}", path.display()))
}

#[derive(Serialize)]
struct ScanOutput<'a> {
    report: &'a ScanReport,
    suggestions: Vec<&'a FileRecord>,
    duplicate_groups: Vec<DuplicateGroup>,
}

/// Scan, rank and print suggestions.
fn run_scan(
    store: Arc<LearningStore>,
    settings: Settings,
    path: &Path,
    filter: &ResultFilter,
    top_n: usize,
    format: OutputFormat,
) -> Result<()> {
    let mut session = Session::new(store, settings.engine).with_scan_options(settings.scan);

    eprintln!("Scanning {}...", path.display());
    let interactive = std::io::stderr().is_terminal();
    if interactive {
        show_progress(&session);
    }

    let report = session.scan(path).context("Scan failed");
    if interactive {
        eprintln!();
    }
    let report = report?;
    let records = session.records()?;
    let matching = session.filter(filter)?;
    let shown: Vec<&FileRecord> = matching.iter().take(top_n).copied().collect();

    match format {
        OutputFormat::Text => {
            let reference = report.reference_time;
            println!();
            println!("{}", "─".repeat(70));
            println!(" {} - {} files", report.root.display(), report.files);
            println!(
                " {} duplicate groups ({} files)",
                report.grouping.groups, report.grouping.duplicate_files
            );
            println!(" Scanned in {:.2}s", report.duration.as_secs_f64());
            println!("{}", "─".repeat(70));
            println!();

            if shown.is_empty() {
                println!(" No matching files.");
            } else {
                println!(
                    " {:>5}  {:>10}  {:>12}  {:>4}  path",
                    "score", "size", "age", "dups"
                );
                for record in &shown {
                    let dups = match record.duplicate_group_size {
                        Some(n) if n > 1 => n.to_string(),
                        _ => "-".to_string(),
                    };
                    println!(
                        " {:>5}  {:>10}  {:>12}  {:>4}  {}",
                        record.score,
                        format_size(record.size_bytes),
                        format_age(record.age(reference)),
                        dups,
                        record.path.display()
                    );
                }
                if matching.len() > shown.len() {
                    println!("  ... and {} more", matching.len() - shown.len());
                }
            }

            if !report.failures.is_empty() {
                println!();
                println!("{} entries could not be read", report.failures.count);
                for warning in &report.failures.samples {
                    println!("   {}: {}", warning.path.display(), warning.message);
                }
            }
        }
        OutputFormat::Json => {
            let output = ScanOutput {
                report: &report,
                suggestions: shown,
                duplicate_groups: collect_groups(records),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Csv => {
            export::write_records(std::io::stdout().lock(), &matching)?;
        }
    }

    Ok(())
}

/// Print walk progress on one stderr line until the walk ends.
fn show_progress(session: &Session) {
    let mut rx = session.subscribe();
    thread::spawn(move || {
        loop {
            match rx.blocking_recv() {
                Ok(progress) => eprint!(
                    "\r  {} files, {} ({:.0} files/s)   ",
                    progress.files_scanned,
                    format_size(progress.bytes_scanned),
                    progress.files_per_second()
                ),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });
}

fn run_trash(store: &LearningStore, paths: &[PathBuf]) -> Result<()> {
    let reports = trash_and_learn(&SystemTrash::new(), store, paths);
    let mut failed = 0;
    for report in &reports {
        println!("{}: {}", report.path.display(), report.outcome);
        if let Some(err) = &report.feedback_error {
            println!("   not learned: {err}");
        }
        if !report.outcome.is_success() {
            failed += 1;
        }
    }
    if failed > 0 {
        bail!("{failed} of {} files were not moved", reports.len());
    }
    Ok(())
}

fn run_keep(store: &LearningStore, paths: &[PathBuf]) -> Result<()> {
    for path in paths {
        let stat = keep_and_learn(store, path)
            .wrap_err_with(|| format!("Failed to record keep for {}", path.display()))?;
        println!(
            "{}: kept ({} bias now {})",
            path.display(),
            display_extension(&stat),
            stat.bias
        );
    }
    Ok(())
}

fn run_stats(store: &LearningStore, format: OutputFormat) -> Result<()> {
    let stats = store.stats()?;
    match format {
        OutputFormat::Text => {
            if stats.is_empty() {
                println!(" Nothing learned yet.");
                return Ok(());
            }
            println!(
                " {:<16} {:>8} {:>8} {:>6}",
                "extension", "deleted", "kept", "bias"
            );
            for stat in &stats {
                println!(
                    " {:<16} {:>8} {:>8} {:>6}",
                    display_extension(stat),
                    stat.delete_count,
                    stat.keep_count,
                    stat.bias
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        OutputFormat::Csv => {
            export::write_stats(std::io::stdout().lock(), &stats)?;
        }
    }
    Ok(())
}

fn display_extension(stat: &ExtStat) -> &str {
    if stat.extension.is_empty() {
        "(none)"
    } else {
        stat.extension.as_str()
    }
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
