//! datesort - move the files of a directory into year/month subdirectories
//!
//! Every regular file directly inside the target directory is moved to
//! `<dir>/<YYYY>/<MM>/`, where year and month come from its last modification time in
//! the local time zone. Paths are built in bounded buffers, intermediate directories
//! are created on demand, and a failure on one file never stops the others.

pub mod cli;
pub mod config;
pub mod directory;
pub mod format;
pub mod history;
pub mod output;
pub mod path_buffer;
pub mod relocator;
pub mod timestamp;
pub mod undo;
pub mod walker;

pub use config::{CompiledFilters, ConfigError, FilterConfig};
pub use directory::{DirectoryError, ensure_directory};
pub use path_buffer::{BoundedPath, PATH_CAPACITY, PathError};
pub use relocator::{RelocateError, Relocation, Relocator, SkipReason};
pub use timestamp::{TimestampParts, decompose};
pub use undo::{UndoManager, UndoReport};

pub use cli::{Args, run_cli};
