//! Bounded, owned filesystem path buffer.
//!
//! Every path the relocator builds goes through [`BoundedPath`]. Appends that would
//! reach the capacity are rejected with [`PathError::TooLong`] and leave the buffer
//! exactly as it was, so a caller can never end up holding a truncated path.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Default capacity in bytes, matching the usual platform maximum path length.
pub const PATH_CAPACITY: usize = 4096;

const SEPARATOR: char = '/';

/// Errors raised while building a path.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    /// The resulting path would reach or exceed the buffer capacity.
    #[error("path too long ({length} bytes, capacity {capacity})")]
    TooLong { length: usize, capacity: usize },
}

/// A filesystem path whose length always stays below a fixed capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundedPath {
    inner: OsString,
    capacity: usize,
}

impl BoundedPath {
    /// Creates a buffer holding `src` with the default [`PATH_CAPACITY`].
    pub fn new(src: impl AsRef<OsStr>) -> Result<Self, PathError> {
        Self::with_capacity(src, PATH_CAPACITY)
    }

    /// Creates a buffer holding `src` with an explicit capacity.
    ///
    /// Fails if `src` is `capacity` bytes or longer.
    pub fn with_capacity(src: impl AsRef<OsStr>, capacity: usize) -> Result<Self, PathError> {
        let src = src.as_ref();
        let length = src.len();
        if length >= capacity {
            return Err(PathError::TooLong { length, capacity });
        }
        Ok(Self {
            inner: src.to_os_string(),
            capacity,
        })
    }

    /// Current length in bytes.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.inner)
    }

    fn ends_with_separator(&self) -> bool {
        self.inner
            .as_encoded_bytes()
            .last()
            .is_some_and(|&b| b == SEPARATOR as u8)
    }

    /// Number of bytes `ensure_trailing_separator` would add.
    fn separator_len(&self) -> usize {
        if self.is_empty() || self.ends_with_separator() {
            0
        } else {
            1
        }
    }

    /// Appends `/` unless the buffer already ends with one.
    ///
    /// An empty buffer is left empty so that names appended to it stay relative.
    pub fn ensure_trailing_separator(&mut self) -> Result<(), PathError> {
        let extra = self.separator_len();
        if extra == 0 {
            return Ok(());
        }
        let length = self.len() + extra;
        if length >= self.capacity {
            return Err(PathError::TooLong {
                length,
                capacity: self.capacity,
            });
        }
        self.inner.push(SEPARATOR.to_string());
        Ok(())
    }

    /// Appends a separator (if needed) followed by `suffix`.
    ///
    /// Either both are appended or nothing is.
    pub fn append(&mut self, suffix: impl AsRef<OsStr>) -> Result<(), PathError> {
        let suffix = suffix.as_ref();
        let length = self.len() + self.separator_len() + suffix.len();
        if length >= self.capacity {
            return Err(PathError::TooLong {
                length,
                capacity: self.capacity,
            });
        }
        self.ensure_trailing_separator()?;
        self.inner.push(suffix);
        Ok(())
    }

    /// Returns a copy of this buffer extended with `suffix`.
    pub fn joined(&self, suffix: impl AsRef<OsStr>) -> Result<Self, PathError> {
        let mut path = self.clone();
        path.append(suffix)?;
        Ok(path)
    }
}

impl AsRef<Path> for BoundedPath {
    fn as_ref(&self) -> &Path {
        self.as_path()
    }
}

impl fmt::Display for BoundedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_path().display())
    }
}
