/// Record of the moves performed during a run.
///
/// When recording is enabled the log is written as JSON next to the organized files,
/// so that a later `--undo` can put every file back where it came from.
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the history file inside the organized directory.
///
/// The relocator never moves an entry with this name.
pub const HISTORY_FILE_NAME: &str = ".datesort_history.json";

/// A single relocated file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub original_path: PathBuf,
    pub new_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationLog {
    /// RFC 3339 time at which the run started.
    pub timestamp: String,
    pub base_path: PathBuf,
    pub operations: Vec<Operation>,
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Failed to write history file: {0}")]
    WriteFailed(#[source] io::Error),
    #[error("Failed to read history file: {0}")]
    ReadFailed(#[source] io::Error),
    #[error("Invalid history file format: {0}")]
    InvalidFormat(String),
}

impl OperationLog {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            timestamp: chrono::Local::now().to_rfc3339(),
            base_path,
            operations: Vec::new(),
        }
    }

    pub fn add_operation(&mut self, operation: Operation) {
        self.operations.push(operation);
    }

    pub fn history_file_path(base_path: &Path) -> PathBuf {
        base_path.join(HISTORY_FILE_NAME)
    }

    pub fn save(&self, base_path: &Path) -> Result<(), HistoryError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| {
            HistoryError::WriteFailed(io::Error::new(io::ErrorKind::InvalidData, e))
        })?;
        fs::write(Self::history_file_path(base_path), json).map_err(HistoryError::WriteFailed)
    }

    /// Loads the log for `base_path`, or `None` when nothing was recorded.
    pub fn load(base_path: &Path) -> Result<Option<Self>, HistoryError> {
        let history_path = Self::history_file_path(base_path);
        if !history_path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&history_path).map_err(HistoryError::ReadFailed)?;
        let log = serde_json::from_str(&json)
            .map_err(|e| HistoryError::InvalidFormat(format!("JSON parse error: {}", e)))?;
        Ok(Some(log))
    }

    pub fn delete(base_path: &Path) -> Result<(), HistoryError> {
        let history_path = Self::history_file_path(base_path);
        if history_path.exists() {
            fs::remove_file(&history_path).map_err(HistoryError::WriteFailed)?;
        }
        Ok(())
    }
}
