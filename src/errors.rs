use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a validation run.
///
/// Expected findings (missing directories, name mismatches, parse failures)
/// are recorded as diagnostics instead; these variants cover conditions the
/// validator cannot reason about, such as a permission error mid-run.
#[derive(Error, Debug)]
pub enum XrefError {
    /// Filesystem I/O error on a specific path.
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The working directory could not be determined.
    #[error("cannot determine working directory: {0}")]
    WorkingDir(#[source] std::io::Error),
}

impl XrefError {
    /// Attach a path to an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias for `Result<T, XrefError>`.
pub type Result<T> = std::result::Result<T, XrefError>;
