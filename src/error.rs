//! Error types shared by the selection core.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the selection core and its adapters.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error while touching a specific path
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed key notation in a binding table
    #[error("invalid key notation: {0}")]
    KeyNotation(String),

    /// Path does not exist under the session root
    #[error("path not found: {0}")]
    NotFound(PathBuf),

    /// Absolute path that does not lie below the session root
    #[error("{0} is outside the session root")]
    OutsideRoot(PathBuf),

    /// `git status` could not be run or returned garbage
    #[error("git error: {0}")]
    Git(String),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
