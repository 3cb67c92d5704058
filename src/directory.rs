//! Idempotent creation of the year and month directories.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Permission bits of newly created destination directories.
pub const DIRECTORY_MODE: u32 = 0o700;

#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The path could not be inspected or created.
    #[error("failed to create path {}: {source}", .path.display())]
    CreateFailed { path: PathBuf, source: io::Error },
}

/// Makes sure something exists at `path`, creating a directory there if needed.
///
/// Any existing entry counts as success, whatever its type: a plain file in the way
/// surfaces later, when a child directory or the moved file cannot be created under it.
/// A concurrent creation that wins the race is also treated as success.
///
/// New directories are readable, writable and searchable by the owner only.
pub fn ensure_directory(path: &Path) -> Result<(), DirectoryError> {
    match fs::metadata(path) {
        Ok(_) => return Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => {
            return Err(DirectoryError::CreateFailed {
                path: path.to_path_buf(),
                source: e,
            });
        }
    }

    match create_private_dir(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(DirectoryError::CreateFailed {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

#[cfg(unix)]
fn create_private_dir(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    fs::DirBuilder::new().mode(DIRECTORY_MODE).create(path)
}

#[cfg(not(unix))]
fn create_private_dir(path: &Path) -> io::Result<()> {
    fs::DirBuilder::new().create(path)
}
