//! Checker workers.
//!
//! Each checker runs on its own OS thread with a single-threaded runtime. A
//! worker shares nothing with the coordinator; it receives
//! [`WorkerMessage`]s and sends [`WorkerEvent`]s.

use crate::protocol::{ConfigPayload, Mode, WorkerError, WorkerEvent, WorkerMessage};
use camino::Utf8PathBuf;
use checker_diagnostics::{CheckerName, ClientPayload, ReportSink, Reporter, Severity};
use checker_runner::CheckRunner;
use checker_watch::{FileWatcher, IgnoreMatcher, WatchController, WatchEvent};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Everything a worker needs besides its runner, fixed at spawn.
#[derive(Debug, Clone)]
pub struct WorkerContext {
    /// Canonical project root.
    pub root: Utf8PathBuf,
    pub mode: Mode,
    pub color: bool,
    /// Serve-mode severity filter.
    pub log_level: Option<Vec<Severity>>,
    pub watch_paths: Vec<String>,
    pub ignore: Vec<String>,
}

/// Coordinator-side handle of a running worker.
///
/// The thread is detached; dropping the handle only closes the control
/// channel.
#[derive(Debug)]
pub struct WorkerHandle {
    checker: CheckerName,
    control: UnboundedSender<WorkerMessage>,
}

impl WorkerHandle {
    pub fn checker(&self) -> CheckerName {
        self.checker
    }

    /// Sends a control message. Returns false once the worker has stopped
    /// listening.
    pub fn send(&self, message: WorkerMessage) -> bool {
        self.control.send(message).is_ok()
    }
}

/// Starts a worker thread for `runner`.
pub fn spawn<R>(
    runner: R,
    ctx: WorkerContext,
    events: UnboundedSender<WorkerEvent>,
) -> Result<WorkerHandle, WorkerError>
where
    R: CheckRunner + 'static,
{
    let checker = runner.name();
    let (control, control_rx) = mpsc::unbounded_channel();

    std::thread::Builder::new()
        .name(format!("checker-{}", checker.id()))
        .spawn(move || run(runner, ctx, control_rx, events))
        .map_err(WorkerError::Spawn)?;

    tracing::debug!(%checker, "spawned worker");
    Ok(WorkerHandle { checker, control })
}

fn run<R: CheckRunner>(
    runner: R,
    ctx: WorkerContext,
    control: UnboundedReceiver<WorkerMessage>,
    events: UnboundedSender<WorkerEvent>,
) {
    let checker = runner.name();

    let result = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(WorkerError::Spawn)
        .and_then(|runtime| {
            runtime.block_on(async {
                match ctx.mode {
                    Mode::Build => build(runner, &ctx, &events).await,
                    Mode::Serve => serve(runner, &ctx, control, &events).await,
                }
            })
        });

    if let Err(e) = result {
        tracing::error!(%checker, error = %e, "checker worker failed");
        let _ = events.send(WorkerEvent::Failed {
            checker,
            error: e.to_string(),
        });
    }
}

/// Forwards a reporter's output to the coordinator.
struct ChannelSink<'a> {
    events: &'a UnboundedSender<WorkerEvent>,
}

// Sends fail only once the coordinator is gone, when nobody is left to tell.
impl ReportSink for ChannelSink<'_> {
    fn write_line(&mut self, line: String) {
        let _ = self.events.send(WorkerEvent::Console(line));
    }

    fn post_overlay(&mut self, payload: ClientPayload) {
        let _ = self.events.send(WorkerEvent::Overlay(payload));
    }
}

/// One full check, one terminal report, one `Finished`.
async fn build<R: CheckRunner>(
    runner: R,
    ctx: &WorkerContext,
    events: &UnboundedSender<WorkerEvent>,
) -> Result<(), WorkerError> {
    let checker = runner.name();
    let reporter = Reporter::new(checker)
        .with_overlay(false)
        .with_color(ctx.color);

    let mut controller = WatchController::new(runner, ctx.root.clone(), reporter);
    let summary = controller
        .initial_check(&mut ChannelSink { events })
        .await?;

    let _ = events.send(WorkerEvent::Finished { checker, summary });
    Ok(())
}

fn serve_reporter(checker: CheckerName, ctx: &WorkerContext, config: ConfigPayload) -> Reporter {
    Reporter::new(checker)
        .with_levels(ctx.log_level.clone())
        .with_terminal(config.enable_terminal)
        .with_overlay(config.enable_overlay)
        .with_color(ctx.color)
}

async fn next_event(watcher: &mut Option<FileWatcher>) -> Option<WatchEvent> {
    match watcher {
        Some(watcher) => watcher.recv().await,
        None => std::future::pending().await,
    }
}

/// Handles control messages, then file events until the watch session ends.
async fn serve<R: CheckRunner>(
    runner: R,
    ctx: &WorkerContext,
    mut control: UnboundedReceiver<WorkerMessage>,
    events: &UnboundedSender<WorkerEvent>,
) -> Result<(), WorkerError> {
    let checker = runner.name();
    let mut runner = Some(runner);
    let mut controller: Option<WatchController<R>> = None;
    let mut watcher: Option<FileWatcher> = None;
    let mut listening = true;
    let mut sink = ChannelSink { events };

    loop {
        tokio::select! {
            message = control.recv(), if listening => match message {
                Some(WorkerMessage::Config(config)) => {
                    let runner = runner
                        .take()
                        .ok_or_else(|| WorkerError::Protocol("received Config twice".to_string()))?;
                    controller = Some(WatchController::new(
                        runner,
                        ctx.root.clone(),
                        serve_reporter(checker, ctx, config),
                    ));
                    tracing::debug!(%checker, "engine configured");
                }
                Some(WorkerMessage::ConfigureServer(server)) => {
                    let engine = controller.as_mut().ok_or_else(|| {
                        WorkerError::Protocol("received ConfigureServer before Config".to_string())
                    })?;
                    if watcher.is_some() {
                        return Err(WorkerError::Protocol(
                            "received ConfigureServer twice".to_string(),
                        ));
                    }

                    // Subscribe first so edits made during the initial check are queued.
                    let matcher = IgnoreMatcher::new(&server.root, &ctx.watch_paths)?
                        .with_excludes(&ctx.ignore)?;
                    watcher = Some(FileWatcher::new(matcher)?);

                    engine.initial_check(&mut sink).await?;
                }
                Some(WorkerMessage::Unref) | None => {
                    tracing::debug!(%checker, "stopped listening for control messages");
                    listening = false;
                }
            },
            event = next_event(&mut watcher) => match event {
                Some(event) => {
                    if let Some(engine) = controller.as_mut() {
                        engine.handle_event(event, &mut sink).await;
                    }
                }
                None => watcher = None,
            },
        }

        if !listening && watcher.is_none() {
            break;
        }
    }

    tracing::debug!(%checker, "worker finished");
    Ok(())
}
