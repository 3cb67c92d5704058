//! Lazy listing of the entry names of one directory.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::Path;

/// Yields the names of the direct entries of a directory, in platform order.
///
/// The walk is not recursive. Entries that cannot be read are yielded as errors so the
/// caller can report them and carry on.
#[derive(Debug)]
pub struct DirectoryWalker {
    entries: fs::ReadDir,
}

impl DirectoryWalker {
    pub fn open(path: &Path) -> io::Result<Self> {
        Ok(Self {
            entries: fs::read_dir(path)?,
        })
    }
}

impl Iterator for DirectoryWalker {
    type Item = io::Result<OsString>;

    fn next(&mut self) -> Option<Self::Item> {
        self.entries
            .next()
            .map(|entry| entry.map(|e| e.file_name()))
    }
}
