use std::path::PathBuf;

use perfdash_core::error::CoreError;

/// Error type for `perfdash` commands.
///
/// Wraps [`CoreError`] for engine errors and adds I/O and encoding variants.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// A domain-level error from `perfdash_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid dashboard document {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Convenience type alias for command return values.
pub type CliResult<T> = Result<T, CliError>;
