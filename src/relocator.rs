//! Classification and relocation of a single directory entry.
//!
//! For an entry `name` of `base`, a regular file modified in March 2022 ends up at
//! `base/2022/03/name`. Each call is independent: whatever happens to one entry, the
//! caller is free to go on with the next one.

use crate::config::{CompiledFilters, LOCAL_CONFIG_NAME};
use crate::directory::{self, DirectoryError};
use crate::format::{FormatError, MONTH_WIDTH, YEAR_WIDTH, format_padded};
use crate::history::{HISTORY_FILE_NAME, Operation};
use crate::path_buffer::{BoundedPath, PathError};
use crate::timestamp::{self, TimestampError, TimestampParts};
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// What happened to an entry that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relocation {
    /// The file was moved.
    Moved {
        operation: Operation,
        parts: TimestampParts,
    },
    /// Dry run: the file would have been moved.
    Planned {
        operation: Operation,
        parts: TimestampParts,
    },
    /// The entry was deliberately left alone.
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Directory, symlink, socket, device or other non-regular entry.
    NotRegularFile,
    /// Excluded by the filter configuration.
    Filtered,
    /// The history file or a configuration file of the run.
    Reserved,
}

/// Per-entry failures. None of them affects other entries.
#[derive(Debug, Error)]
pub enum RelocateError {
    #[error("{}: {source}", .path.display())]
    PathTooLong { path: PathBuf, source: PathError },

    #[error("{}: {source}", .path.display())]
    Metadata { path: PathBuf, source: io::Error },

    #[error("{}: {source}", .path.display())]
    Timestamp {
        path: PathBuf,
        source: TimestampError,
    },

    #[error("{}: {source}", .path.display())]
    Format { path: PathBuf, source: FormatError },

    #[error(transparent)]
    CreateFailed(#[from] DirectoryError),

    #[error("failed to move {} to {}: {source}", .from.display(), .to.display())]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
}

/// Destination paths of one file, all built before the filesystem is touched.
struct Destination {
    year_dir: BoundedPath,
    month_dir: BoundedPath,
    file: BoundedPath,
}

/// Moves regular files into year/month subdirectories of their own directory.
#[derive(Debug, Default)]
pub struct Relocator {
    filters: CompiledFilters,
    dry_run: bool,
}

fn extend(path: &BoundedPath, suffix: &OsStr) -> Result<BoundedPath, RelocateError> {
    path.joined(suffix)
        .map_err(|source| RelocateError::PathTooLong {
            path: path.as_path().join(suffix),
            source,
        })
}

impl Relocator {
    pub fn new(filters: CompiledFilters) -> Self {
        Self {
            filters,
            dry_run: false,
        }
    }

    /// In dry-run mode destinations are computed but nothing is created or moved.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// The history file, any local configuration file and the configuration the
    /// filters were loaded from stay where they are.
    fn is_reserved(&self, file_name: &OsStr, source: &Path) -> bool {
        if file_name == OsStr::new(HISTORY_FILE_NAME) || file_name == OsStr::new(LOCAL_CONFIG_NAME)
        {
            return true;
        }
        self.filters
            .source()
            .is_some_and(|config| fs::canonicalize(source).is_ok_and(|path| path == config))
    }

    /// Classifies the entry `file_name` of `base` and, if it is a regular file,
    /// moves it to `base/YYYY/MM/file_name`.
    ///
    /// The modification time is read in the local time zone. Both directory levels are
    /// created with owner-only permissions when missing. An existing file at the
    /// destination is handled by the platform's rename: on POSIX it is replaced.
    pub fn relocate(
        &self,
        base: &BoundedPath,
        file_name: &OsStr,
    ) -> Result<Relocation, RelocateError> {
        let source = extend(base, file_name)?;

        let metadata =
            fs::symlink_metadata(source.as_path()).map_err(|e| RelocateError::Metadata {
                path: source.as_path().to_path_buf(),
                source: e,
            })?;
        if !metadata.file_type().is_file() {
            return Ok(Relocation::Skipped(SkipReason::NotRegularFile));
        }
        if self.is_reserved(file_name, source.as_path()) {
            return Ok(Relocation::Skipped(SkipReason::Reserved));
        }
        if !self.filters.should_include(Path::new(file_name)) {
            return Ok(Relocation::Skipped(SkipReason::Filtered));
        }

        let modified = metadata.modified().map_err(|e| RelocateError::Metadata {
            path: source.as_path().to_path_buf(),
            source: e,
        })?;
        let parts = timestamp::decompose(timestamp::epoch_seconds(modified)).map_err(|e| {
            RelocateError::Timestamp {
                path: source.as_path().to_path_buf(),
                source: e,
            }
        })?;

        let destination = Self::destination(base, parts, file_name)?;
        let operation = Operation {
            original_path: source.as_path().to_path_buf(),
            new_path: destination.file.as_path().to_path_buf(),
        };

        if self.dry_run {
            return Ok(Relocation::Planned { operation, parts });
        }

        directory::ensure_directory(destination.year_dir.as_path())?;
        directory::ensure_directory(destination.month_dir.as_path())?;

        fs::rename(source.as_path(), destination.file.as_path()).map_err(|e| {
            RelocateError::MoveFailed {
                from: source.as_path().to_path_buf(),
                to: destination.file.as_path().to_path_buf(),
                source: e,
            }
        })?;

        Ok(Relocation::Moved { operation, parts })
    }

    fn destination(
        base: &BoundedPath,
        parts: TimestampParts,
        file_name: &OsStr,
    ) -> Result<Destination, RelocateError> {
        let padded = |value: i64, width: usize| {
            format_padded(value, width).map_err(|source| RelocateError::Format {
                path: base.as_path().to_path_buf(),
                source,
            })
        };
        let year = padded(i64::from(parts.year), YEAR_WIDTH)?;
        let month = padded(i64::from(parts.month), MONTH_WIDTH)?;

        let year_dir = extend(base, OsStr::new(&year))?;
        let month_dir = extend(&year_dir, OsStr::new(&month))?;
        let file = extend(&month_dir, file_name)?;
        Ok(Destination {
            year_dir,
            month_dir,
            file,
        })
    }
}
