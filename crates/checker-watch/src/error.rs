//! Error types for the checker-watch crate.

use camino::Utf8PathBuf;

/// Errors that can occur while setting up a watch session.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// Failed to initialize or operate the notify watcher.
    #[error("notify watcher error: {0}")]
    Notify(#[from] notify::Error),

    /// The watched root does not exist.
    #[error("path does not exist: {0}")]
    PathNotFound(Utf8PathBuf),

    /// A watch pattern is not a valid glob.
    #[error("invalid watch pattern `{pattern}`: {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}
