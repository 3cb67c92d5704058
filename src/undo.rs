/// Reverting a recorded organization run.
///
/// Every file listed in the history log is moved back to where it was found, newest
/// move first. Month and year directories left empty by the restore are removed.
use crate::history::{HistoryError, Operation, OperationLog};
use crate::output::OutputFormatter;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UndoError {
    #[error("Invalid base path {}", .0.display())]
    InvalidBasePath(PathBuf),
    #[error("No previous organization found to undo in {}", .0.display())]
    NoHistory(PathBuf),
    #[error(transparent)]
    History(#[from] HistoryError),
}

#[derive(Debug, Default)]
pub struct UndoReport {
    /// Original paths the files were restored to.
    pub restored: Vec<PathBuf>,
    /// Files that could not be restored, with the reason.
    pub failed_restores: Vec<(PathBuf, String)>,
    /// Files no longer found at their recorded location.
    pub skipped_files: Vec<(PathBuf, String)>,
}

impl UndoReport {
    pub fn restored_files(&self) -> usize {
        self.restored.len()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed_restores.is_empty() && self.skipped_files.is_empty()
    }
}

enum RestoreFailure {
    Missing(PathBuf, String),
    Failed(PathBuf, String),
}

pub struct UndoManager;

impl UndoManager {
    /// Restores the moves recorded for `base_path`.
    ///
    /// A file already present at an original location is first renamed to
    /// `<name>.bak.<YYYYmmdd-HHMMSS>`. The history file is deleted only when every
    /// file was restored.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use datesort::undo::UndoManager;
    /// use std::path::Path;
    ///
    /// match UndoManager::undo(Path::new("/path/to/photos")) {
    ///     Ok(report) => println!("Restored {} files", report.restored_files()),
    ///     Err(e) => eprintln!("Undo failed: {}", e),
    /// }
    /// ```
    pub fn undo(base_path: &Path) -> Result<UndoReport, UndoError> {
        if !base_path.is_dir() {
            return Err(UndoError::InvalidBasePath(base_path.to_path_buf()));
        }

        let log = OperationLog::load(base_path)?
            .ok_or_else(|| UndoError::NoHistory(base_path.to_path_buf()))?;

        let mut report = UndoReport::default();
        for operation in log.operations.iter().rev() {
            match Self::restore_file(operation) {
                Ok(()) => {
                    Self::prune_empty_dirs(operation);
                    report.restored.push(operation.original_path.clone());
                }
                Err(RestoreFailure::Missing(path, reason)) => {
                    report.skipped_files.push((path, reason));
                }
                Err(RestoreFailure::Failed(path, reason)) => {
                    report.failed_restores.push((path, reason));
                }
            }
        }

        if report.is_complete_success()
            && let Err(e) = OperationLog::delete(base_path)
        {
            OutputFormatter::warning(&format!("Could not delete history file: {}", e));
        }

        Ok(report)
    }

    fn restore_file(operation: &Operation) -> Result<(), RestoreFailure> {
        if !operation.new_path.exists() {
            return Err(RestoreFailure::Missing(
                operation.new_path.clone(),
                "File not found at expected location".to_string(),
            ));
        }

        let backup_path = if operation.original_path.exists() {
            let backup_path = Self::generate_backup_path(&operation.original_path);
            fs::rename(&operation.original_path, &backup_path).map_err(|e| {
                RestoreFailure::Failed(
                    operation.original_path.clone(),
                    format!("Could not backup conflicting file: {}", e),
                )
            })?;
            Some(backup_path)
        } else {
            None
        };

        let Err(e) = fs::rename(&operation.new_path, &operation.original_path) else {
            return Ok(());
        };

        // Put the conflicting file back under its own name.
        let mut reason = format!("Failed to restore file: {}", e);
        if let Some(backup_path) = backup_path
            && let Err(rollback) = fs::rename(&backup_path, &operation.original_path)
        {
            reason.push_str(&format!(
                "; conflicting file left at {}: {}",
                backup_path.display(),
                rollback
            ));
        }
        Err(RestoreFailure::Failed(operation.new_path.clone(), reason))
    }

    /// Removes the month and then the year directory if the restore emptied them.
    fn prune_empty_dirs(operation: &Operation) {
        let stop = operation.original_path.parent();
        let mut dir = operation.new_path.parent();
        for _ in 0..2 {
            match dir {
                Some(current) if Some(current) != stop => {
                    // fails, and stops the pruning, while other files remain
                    if fs::remove_dir(current).is_err() {
                        break;
                    }
                    dir = current.parent();
                }
                _ => break,
            }
        }
    }

    /// `file.txt` becomes `file.txt.bak.20251109-143052`.
    fn generate_backup_path(original_path: &Path) -> PathBuf {
        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let filename = original_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        original_path.with_file_name(format!("{}.bak.{}", filename, timestamp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_buffer::BoundedPath;
    use crate::relocator::{Relocation, Relocator};
    use std::ffi::OsStr;
    use tempfile::TempDir;

    fn organize(base_path: &Path, names: &[&str]) -> OperationLog {
        let base = BoundedPath::new(base_path).unwrap();
        let relocator = Relocator::default();
        let mut log = OperationLog::new(base_path.to_path_buf());
        for name in names {
            match relocator.relocate(&base, OsStr::new(name)).expect("Failed to move file") {
                Relocation::Moved { operation, .. } => log.add_operation(operation),
                other => panic!("Unexpected outcome {other:?}"),
            }
        }
        log.save(base_path).expect("Failed to save history");
        log
    }

    #[test]
    fn test_undo_no_history() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let result = UndoManager::undo(temp_dir.path());
        assert!(matches!(result, Err(UndoError::NoHistory(_))));
    }

    #[test]
    fn test_undo_invalid_base_path() {
        let result = UndoManager::undo(Path::new("/non/existent/path"));
        assert!(matches!(result, Err(UndoError::InvalidBasePath(_))));
    }

    #[test]
    fn test_undo_restores_and_prunes() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        fs::write(base_path.join("a.txt"), "a").unwrap();
        fs::write(base_path.join("b.txt"), "b").unwrap();

        let log = organize(base_path, &["a.txt", "b.txt"]);
        let month_dir = log.operations[0].new_path.parent().unwrap().to_path_buf();
        let year_dir = month_dir.parent().unwrap().to_path_buf();
        assert!(!base_path.join("a.txt").exists());

        let report = UndoManager::undo(base_path).expect("Undo failed");

        assert_eq!(report.restored_files(), 2);
        assert!(report.is_complete_success());
        assert_eq!(fs::read_to_string(base_path.join("a.txt")).unwrap(), "a");
        assert_eq!(fs::read_to_string(base_path.join("b.txt")).unwrap(), "b");
        assert!(!month_dir.exists());
        assert!(!year_dir.exists());
        assert!(!OperationLog::history_file_path(base_path).exists());
    }

    #[test]
    fn test_undo_keeps_directories_with_other_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        fs::write(base_path.join("a.txt"), "a").unwrap();

        let log = organize(base_path, &["a.txt"]);
        let month_dir = log.operations[0].new_path.parent().unwrap().to_path_buf();
        fs::write(month_dir.join("unrelated.txt"), "stay").unwrap();

        UndoManager::undo(base_path).expect("Undo failed");

        assert!(base_path.join("a.txt").exists());
        assert!(month_dir.join("unrelated.txt").exists());
    }

    #[test]
    fn test_undo_with_file_name_conflict() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        fs::write(base_path.join("test.txt"), "original content").unwrap();
        organize(base_path, &["test.txt"]);

        fs::write(base_path.join("test.txt"), "new content").unwrap();

        let report = UndoManager::undo(base_path).expect("Undo failed");
        assert_eq!(report.restored_files(), 1);
        assert_eq!(
            fs::read_to_string(base_path.join("test.txt")).unwrap(),
            "original content"
        );

        let backups: Vec<_> = fs::read_dir(base_path)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("test.txt.bak."))
            .collect();
        assert_eq!(backups.len(), 1);
    }

    #[test]
    fn test_undo_with_missing_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();

        let mut log = OperationLog::new(base_path.to_path_buf());
        log.add_operation(Operation {
            original_path: base_path.join("gone.txt"),
            new_path: base_path.join("2020").join("01").join("gone.txt"),
        });
        log.save(base_path).unwrap();

        let report = UndoManager::undo(base_path).expect("Undo failed");
        assert_eq!(report.restored_files(), 0);
        assert_eq!(report.skipped_files.len(), 1);
        // history is kept for a later attempt
        assert!(OperationLog::history_file_path(base_path).exists());
    }

    #[test]
    fn test_failed_restore_puts_conflicting_file_back() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        let month_dir = base_path.join("2020").join("01");
        fs::create_dir_all(&month_dir).unwrap();
        let original = month_dir.join("clash.txt");
        fs::write(&original, "keep me").unwrap();

        // a directory cannot be renamed into itself, so the restore fails
        let mut log = OperationLog::new(base_path.to_path_buf());
        log.add_operation(Operation {
            original_path: original.clone(),
            new_path: base_path.join("2020"),
        });
        log.save(base_path).unwrap();

        let report = UndoManager::undo(base_path).expect("Undo failed");
        assert_eq!(report.restored_files(), 0);
        assert_eq!(report.failed_restores.len(), 1);
        assert_eq!(fs::read_to_string(&original).unwrap(), "keep me");

        let leftovers: Vec<_> = fs::read_dir(&month_dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".bak."))
            .collect();
        assert!(leftovers.is_empty());
        assert!(OperationLog::history_file_path(base_path).exists());
    }
}
