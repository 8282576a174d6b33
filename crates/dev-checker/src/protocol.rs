//! Messages exchanged between the coordinator and checker workers.

use camino::Utf8PathBuf;
use checker_diagnostics::{CheckerName, ClientPayload, ReportSummary};
use checker_runner::CheckerError;
use checker_watch::WatchError;

/// How the host runs the checkers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Check once and exit.
    Build,
    /// Check, then keep checking on file changes.
    Serve,
}

/// Output switches sent with [`WorkerMessage::Config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigPayload {
    pub enable_overlay: bool,
    pub enable_terminal: bool,
}

/// Sent with [`WorkerMessage::ConfigureServer`] once the overlay transport is
/// ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerPayload {
    /// Directory the watch session is rooted at.
    pub root: Utf8PathBuf,
}

/// Coordinator to worker. Only used in serve mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerMessage {
    /// Builds the worker's engine. Sent exactly once, right after spawn.
    Config(ConfigPayload),
    /// Runs the initial check and starts watching. Requires a prior `Config`.
    ConfigureServer(ServerPayload),
    /// The worker stops listening for messages and keeps its watch session.
    Unref,
}

/// Worker to coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    /// One terminal entry.
    Console(String),
    /// One overlay payload.
    Overlay(ClientPayload),
    /// A build-mode worker completed its check.
    Finished {
        checker: CheckerName,
        summary: ReportSummary,
    },
    /// The worker stopped because of an error.
    Failed { checker: CheckerName, error: String },
}

/// Errors that end a worker.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// The coordinator sent messages out of order.
    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error(transparent)]
    Checker(#[from] CheckerError),

    #[error(transparent)]
    Watch(#[from] WatchError),

    /// The worker thread or its runtime could not be started.
    #[error("failed to start worker: {0}")]
    Spawn(#[source] std::io::Error),
}
