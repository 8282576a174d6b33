//! Spawns one worker per checker and routes their events.

use crate::config::Settings;
use crate::overlay::OverlayTransport;
use crate::protocol::{
    ConfigPayload, Mode, ServerPayload, WorkerError, WorkerEvent, WorkerMessage,
};
use crate::worker::{self, WorkerContext, WorkerHandle};
use camino::Utf8Path;
use checker_diagnostics::CheckerName;
use std::io::Write;
use tokio::sync::mpsc::{self, UnboundedReceiver};

/// Totals of a build-mode run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOutcome {
    pub errors: usize,
    pub warnings: usize,
    /// Checkers whose worker reported a failure.
    pub failed: Vec<CheckerName>,
    /// Workers that ended without reporting anything.
    pub missing: usize,
}

impl BuildOutcome {
    /// Returns true if the run should exit with a non-zero status.
    pub fn is_failure(&self, fail_on_warnings: bool) -> bool {
        self.errors > 0
            || (fail_on_warnings && self.warnings > 0)
            || !self.failed.is_empty()
            || self.missing > 0
    }
}

/// Owns the worker handles and the shared event channel.
#[derive(Debug)]
pub struct Coordinator {
    workers: Vec<WorkerHandle>,
    events: UnboundedReceiver<WorkerEvent>,
}

impl Coordinator {
    /// Spawns a worker for every configured checker.
    ///
    /// In serve mode each worker is sent its `Config` right away; build-mode
    /// workers get no control messages.
    pub fn spawn(settings: &Settings) -> Result<Self, WorkerError> {
        let (tx, events) = mpsc::unbounded_channel();

        let workers = settings
            .checkers
            .iter()
            .map(|checker| {
                let ctx = WorkerContext {
                    root: settings.root.clone(),
                    mode: settings.mode,
                    color: settings.color,
                    log_level: checker.log_level.clone(),
                    watch_paths: checker.watch_paths.clone(),
                    ignore: settings.ignore.clone(),
                };
                worker::spawn(checker.runner.clone(), ctx, tx.clone())
            })
            .collect::<Result<Vec<_>, _>>()?;

        let coordinator = Self { workers, events };

        if settings.mode == Mode::Serve {
            coordinator.broadcast(WorkerMessage::Config(ConfigPayload {
                enable_overlay: settings.overlay,
                enable_terminal: settings.terminal,
            }));
        }

        Ok(coordinator)
    }

    /// Starts every worker's watch session, then detaches the workers from
    /// control messages. Call once, after the overlay transport exists.
    pub fn configure_server(&self, root: &Utf8Path) {
        self.broadcast(WorkerMessage::ConfigureServer(ServerPayload {
            root: root.to_owned(),
        }));
        self.broadcast(WorkerMessage::Unref);
    }

    fn broadcast(&self, message: WorkerMessage) {
        for worker in &self.workers {
            if !worker.send(message.clone()) {
                tracing::debug!(checker = %worker.checker(), "worker no longer listening");
            }
        }
    }

    /// Prints worker output until every worker has finished or failed.
    pub async fn run_build(mut self, out: &mut impl Write) -> BuildOutcome {
        let pending = self.workers.len();
        drain_build(&mut self.events, pending, out).await
    }

    /// Routes worker output until every worker has stopped. Returns the
    /// checkers that failed.
    pub async fn serve(
        mut self,
        out: &mut impl Write,
        overlay: &mut impl OverlayTransport,
    ) -> Vec<CheckerName> {
        let live = self.workers.len();
        route_serve(&mut self.events, live, out, overlay).await
    }
}

fn print_line(out: &mut impl Write, line: &str) {
    if let Err(e) = writeln!(out, "{line}") {
        tracing::warn!(error = %e, "failed to write to terminal");
    }
}

async fn route_serve(
    events: &mut UnboundedReceiver<WorkerEvent>,
    mut live: usize,
    out: &mut impl Write,
    overlay: &mut impl OverlayTransport,
) -> Vec<CheckerName> {
    let mut failed = Vec::new();

    while live > 0 {
        let Some(event) = events.recv().await else {
            break;
        };
        match event {
            WorkerEvent::Console(line) => print_line(out, &line),
            WorkerEvent::Overlay(payload) => overlay.post(&payload),
            WorkerEvent::Finished { checker, .. } => {
                tracing::debug!(%checker, "worker finished");
                live -= 1;
            }
            WorkerEvent::Failed { checker, error } => {
                tracing::error!(%checker, %error, "checker stopped");
                failed.push(checker);
                live -= 1;
            }
        }
    }

    failed
}

async fn drain_build(
    events: &mut UnboundedReceiver<WorkerEvent>,
    mut pending: usize,
    out: &mut impl Write,
) -> BuildOutcome {
    let mut outcome = BuildOutcome::default();

    while pending > 0 {
        let Some(event) = events.recv().await else {
            tracing::error!(pending, "workers exited without reporting");
            outcome.missing = pending;
            break;
        };
        match event {
            WorkerEvent::Console(line) => print_line(out, &line),
            WorkerEvent::Overlay(_) => tracing::debug!("ignoring overlay payload in build mode"),
            WorkerEvent::Finished { checker, summary } => {
                tracing::debug!(
                    %checker,
                    errors = summary.errors,
                    warnings = summary.warnings,
                    "checker finished"
                );
                outcome.errors += summary.errors;
                outcome.warnings += summary.warnings;
                pending -= 1;
            }
            WorkerEvent::Failed { checker, error } => {
                tracing::error!(%checker, %error, "checker failed");
                outcome.failed.push(checker);
                pending -= 1;
            }
        }
    }

    outcome
}
