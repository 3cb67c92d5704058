//! Command-line interface for datesort.
//!
//! Parses the arguments, validates the target directory and drives the walk:
//! every entry is handed to the [`Relocator`], failures are reported and the walk
//! always goes on with the next entry.

use crate::config::{ConfigError, FilterConfig};
use crate::history::{Operation, OperationLog};
use crate::output::{OutputFormatter, RunReporter};
use crate::path_buffer::{BoundedPath, PATH_CAPACITY};
use crate::relocator::{Relocation, Relocator};
use crate::timestamp::TimestampParts;
use crate::undo::{UndoError, UndoManager};
use crate::walker::DirectoryWalker;
use clap::Parser;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Parser)]
#[command(name = "datesort", version)]
#[command(about = "Move files into YYYY/MM subdirectories by modification time")]
pub struct Args {
    /// Directory whose files are organized
    pub directory: PathBuf,

    /// Print the destinations without creating directories or moving files
    #[arg(long, conflicts_with = "undo")]
    pub dry_run: bool,

    /// Record the moves so that they can be reverted with --undo
    #[arg(long, conflicts_with_all = ["dry_run", "undo"])]
    pub record: bool,

    /// Move back the files of the last recorded run
    #[arg(long)]
    pub undo: bool,

    /// Filter configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print a per-month summary on stderr when done
    #[arg(long)]
    pub summary: bool,

    /// Show a progress spinner on stderr
    #[arg(long)]
    pub progress: bool,
}

/// Errors that end the run before any entry is processed.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Invalid path length {length} (expected more than 1 and less than {capacity} bytes)")]
    InvalidPathLength { length: usize, capacity: usize },

    #[error("Directory '{}' does not exist: {source}", .path.display())]
    NotFound { path: PathBuf, source: io::Error },

    #[error("Error reading directory {}: {source}", .path.display())]
    ReadDir { path: PathBuf, source: io::Error },

    #[error("Error loading configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Undo(#[from] UndoError),
}

/// Outcome counts of one organization run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Moves performed, or planned in a dry run, in walk order.
    pub operations: Vec<Operation>,
    pub month_counts: BTreeMap<TimestampParts, usize>,
    pub skipped: usize,
    pub failed: usize,
}

impl RunReport {
    fn record(&mut self, operation: Operation, parts: TimestampParts) {
        self.operations.push(operation);
        *self.month_counts.entry(parts).or_insert(0) += 1;
    }
}

/// Checks the target directory argument and turns it into a path buffer.
///
/// The directory must exist; arguments of one byte or less, or too long to leave
/// room for anything below them, are rejected.
pub fn validate_directory(directory: &std::path::Path) -> Result<BoundedPath, CliError> {
    let length = directory.as_os_str().len();
    if length <= 1 || length >= PATH_CAPACITY {
        return Err(CliError::InvalidPathLength {
            length,
            capacity: PATH_CAPACITY,
        });
    }

    fs::metadata(directory).map_err(|source| CliError::NotFound {
        path: directory.to_path_buf(),
        source,
    })?;

    BoundedPath::new(directory).map_err(|_| CliError::InvalidPathLength {
        length,
        capacity: PATH_CAPACITY,
    })
}

/// Runs the command described by `args`.
///
/// Per-file failures are reported on stderr and do not make the run fail.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use datesort::cli::{Args, run_cli};
///
/// let args = Args::parse_from(["datesort", "/path/to/photos", "--dry-run"]);
/// if let Err(e) = run_cli(&args) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(args: &Args) -> Result<(), CliError> {
    let base = validate_directory(&args.directory)?;

    if args.undo {
        return undo_organization(&base);
    }

    let filters = FilterConfig::load(args.config.as_deref())?.compile()?;
    let relocator = Relocator::new(filters).with_dry_run(args.dry_run);
    let reporter = RunReporter::new(args.progress);

    if args.dry_run {
        OutputFormatter::dry_run_notice(&format!("Analyzing contents of: {}", base));
    }

    let report = organize_directory(&base, &relocator, &reporter);
    reporter.finish();
    let report = report?;

    if args.record {
        save_history(&base, &report);
    }

    if args.summary {
        OutputFormatter::summary_table(&report.month_counts);
    }

    if args.dry_run {
        OutputFormatter::dry_run_notice("No files were modified.");
    }

    if report.failed > 0 {
        OutputFormatter::warning(&format!(
            "{} {} could not be organized",
            report.failed,
            if report.failed == 1 { "entry" } else { "entries" }
        ));
    }

    Ok(())
}

/// Walks `base` once and relocates every entry.
///
/// Destinations are printed on stdout as soon as each entry is done. Only a failure
/// to open the directory is returned as an error.
pub fn organize_directory(
    base: &BoundedPath,
    relocator: &Relocator,
    reporter: &RunReporter,
) -> Result<RunReport, CliError> {
    let walker = DirectoryWalker::open(base.as_path()).map_err(|source| CliError::ReadDir {
        path: base.as_path().to_path_buf(),
        source,
    })?;

    let mut report = RunReport::default();
    for entry in walker {
        let name = match entry {
            Ok(name) => name,
            Err(e) => {
                reporter.error(&format!("{}: {}", base, e));
                report.failed += 1;
                continue;
            }
        };
        reporter.tick(&name);

        match relocator.relocate(base, &name) {
            Ok(Relocation::Moved { operation, parts })
            | Ok(Relocation::Planned { operation, parts }) => {
                reporter.destination(&operation.new_path);
                report.record(operation, parts);
            }
            Ok(Relocation::Skipped(_)) => report.skipped += 1,
            Err(e) => {
                reporter.error(&e.to_string());
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

/// Appends the moves of this run to the recorded history, so that one `--undo`
/// reverts every recorded run since the last undo.
fn save_history(base: &BoundedPath, report: &RunReport) {
    let mut log = match OperationLog::load(base.as_path()) {
        Ok(Some(log)) => log,
        Ok(None) => OperationLog::new(base.as_path().to_path_buf()),
        Err(e) => {
            OutputFormatter::warning(&format!(
                "Existing history could not be read and will be replaced: {}",
                e
            ));
            OperationLog::new(base.as_path().to_path_buf())
        }
    };
    for operation in &report.operations {
        log.add_operation(operation.clone());
    }

    match log.save(base.as_path()) {
        Ok(()) => OutputFormatter::info(&format!(
            "History saved. Use 'datesort {} --undo' to revert changes.",
            base
        )),
        Err(e) => OutputFormatter::warning(&format!("Could not save history: {}", e)),
    }
}

fn undo_organization(base: &BoundedPath) -> Result<(), CliError> {
    OutputFormatter::info("Undoing previous organization...");

    let report = UndoManager::undo(base.as_path())?;
    for path in &report.restored {
        OutputFormatter::destination(path);
    }

    OutputFormatter::success(&format!("Restored: {}", report.restored_files()));
    for (path, reason) in &report.skipped_files {
        OutputFormatter::warning(&format!("Skipped {}: {}", path.display(), reason));
    }
    for (path, reason) in &report.failed_restores {
        OutputFormatter::error(&format!("{}: {}", path.display(), reason));
    }
    if !report.is_complete_success() {
        OutputFormatter::warning("History file was kept. Fix the issues above and try again.");
    }

    Ok(())
}
