//! Output formatting and diagnostics.
//!
//! Standard output only ever receives destination paths, one per line and without
//! styling, so that it can be piped into other tools. Everything else (errors,
//! warnings, notices, the summary table and the progress spinner) goes to standard
//! error.

use crate::timestamp::TimestampParts;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::Path;

pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a relocated (or, in a dry run, to-be-relocated) path on stdout.
    pub fn destination(path: &Path) {
        println!("{}", path.display());
    }

    /// Prints an error message in red with an X mark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use datesort::output::OutputFormatter;
    /// OutputFormatter::error("failed to move photos/a.jpg");
    /// ```
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    pub fn success(message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    pub fn info(message: &str) {
        eprintln!("{}", message.cyan());
    }

    pub fn dry_run_notice(message: &str) {
        eprintln!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a spinner counting processed entries.
    ///
    /// indicatif draws nothing when stderr is not a terminal.
    pub fn create_spinner() -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {pos} entries {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner
    }

    /// Rows of the per-month summary, oldest month first, followed by the total.
    pub fn summary_lines(month_counts: &BTreeMap<TimestampParts, usize>) -> Vec<String> {
        let total: usize = month_counts.values().sum();
        let mut lines: Vec<String> = month_counts
            .iter()
            .map(|(parts, count)| {
                format!(
                    "{:04}/{:02} | {} {}",
                    parts.year,
                    parts.month,
                    count,
                    file_word(*count)
                )
            })
            .collect();
        lines.push(format!("Total   | {} {}", total, file_word(total)));
        lines
    }

    /// Prints the per-month summary table on stderr.
    pub fn summary_table(month_counts: &BTreeMap<TimestampParts, usize>) {
        eprintln!("\n{}", "SUMMARY".bold());
        eprintln!("{} | {}", "Month  ".bold(), "Files".bold());
        eprintln!("{}", "-".repeat(20));
        let lines = Self::summary_lines(month_counts);
        if let Some((total, rows)) = lines.split_last() {
            for row in rows {
                eprintln!("{}", row);
            }
            eprintln!("{}", "-".repeat(20));
            eprintln!("{}", total.green());
        }
    }
}

fn file_word(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}

/// Routes per-entry output of a run, keeping an optional spinner out of the way.
pub struct RunReporter {
    spinner: Option<ProgressBar>,
}

impl RunReporter {
    pub fn new(show_progress: bool) -> Self {
        Self {
            spinner: show_progress.then(OutputFormatter::create_spinner),
        }
    }

    fn emit(&self, print: impl FnOnce()) {
        match &self.spinner {
            Some(spinner) => spinner.suspend(print),
            None => print(),
        }
    }

    pub fn tick(&self, name: &OsStr) {
        if let Some(spinner) = &self.spinner {
            spinner.set_message(name.to_string_lossy().into_owned());
            spinner.inc(1);
        }
    }

    pub fn destination(&self, path: &Path) {
        self.emit(|| OutputFormatter::destination(path));
    }

    pub fn error(&self, message: &str) {
        self.emit(|| OutputFormatter::error(message));
    }

    pub fn finish(&self) {
        if let Some(spinner) = &self.spinner {
            spinner.finish_and_clear();
        }
    }
}
