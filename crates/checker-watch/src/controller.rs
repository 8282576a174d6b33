//! Watch controller: keeps one checker's diagnostics current.

use crate::events::WatchEvent;
use camino::{Utf8Path, Utf8PathBuf};
use checker_diagnostics::{
    normalize_all, CheckerName, DiagnosticStore, ReportSink, ReportSummary, Reporter, Severity,
    UnifiedDiagnostic,
};
use checker_runner::{CheckRunner, CheckerError};

/// Lifecycle state of a [`WatchController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// The initial full check has not completed.
    Idle,
    /// The store holds a full result and file events are applied to it.
    Watching,
}

/// Runs a checker once over the project, then incrementally per file event.
///
/// Events are applied strictly one at a time; the caller feeds them in
/// arrival order.
#[derive(Debug)]
pub struct WatchController<R> {
    runner: R,
    root: Utf8PathBuf,
    store: DiagnosticStore,
    reporter: Reporter,
    state: ControllerState,
}

impl<R: CheckRunner> WatchController<R> {
    /// Creates an idle controller.
    pub fn new(runner: R, root: impl Into<Utf8PathBuf>, reporter: Reporter) -> Self {
        Self {
            runner,
            root: root.into(),
            store: DiagnosticStore::new(),
            reporter,
            state: ControllerState::Idle,
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Returns the diagnostic store.
    pub fn store(&self) -> &DiagnosticStore {
        &self.store
    }

    /// Returns the project root.
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Runs the full project check, fills the store and reports it.
    ///
    /// On success the controller is `Watching`. A failed run leaves it `Idle`
    /// and is returned to the caller.
    pub async fn initial_check(
        &mut self,
        sink: &mut impl ReportSink,
    ) -> Result<ReportSummary, CheckerError> {
        let records = self.runner.check_project(&self.root).await?;
        self.store.init_with(normalize_all(records));
        self.state = ControllerState::Watching;

        tracing::debug!(
            checker = %self.runner.name(),
            files = self.store.file_count(),
            diagnostics = self.store.len(),
            "initial check finished"
        );

        Ok(self.reporter.report(&self.store, sink))
    }

    /// Applies one file event and reports the updated store.
    ///
    /// Returns `None` while `Idle`, where events are dropped.
    pub async fn handle_event(
        &mut self,
        event: WatchEvent,
        sink: &mut impl ReportSink,
    ) -> Option<ReportSummary> {
        if self.state == ControllerState::Idle {
            tracing::debug!(path = %event.path(), "dropping event before initial check");
            return None;
        }

        match event {
            WatchEvent::Change(path) => {
                let diagnostics = self.check_file(&path).await;
                self.store.update_for_file(path.as_str(), diagnostics);
            }
            WatchEvent::Unlink(path) => {
                tracing::debug!(checker = %self.runner.name(), %path, "path removed");
                self.store.update_for_file(path.as_str(), Vec::new());
                // A removed directory takes its files with it.
                let removed = self.store.remove_under(path.as_str());
                if removed > 0 {
                    tracing::debug!(%path, files = removed, "cleared files of removed directory");
                }
            }
        }

        Some(self.reporter.report(&self.store, sink))
    }

    async fn check_file(&self, path: &Utf8Path) -> Vec<UnifiedDiagnostic> {
        tracing::debug!(checker = %self.runner.name(), %path, "checking changed file");

        match self.runner.check_file(&self.root, path).await {
            Ok(records) => normalize_all(records),
            Err(e) => {
                tracing::warn!(
                    checker = %self.runner.name(),
                    %path,
                    error = %e,
                    "file check failed"
                );
                vec![check_failure(self.runner.name(), path, &e)]
            }
        }
    }
}

/// The diagnostic standing in for a file whose check could not run.
fn check_failure(checker: CheckerName, path: &Utf8Path, error: &CheckerError) -> UnifiedDiagnostic {
    UnifiedDiagnostic::new(checker, format!("{checker} could not check this file"))
        .with_file(path.as_str())
        .with_severity(Severity::Error)
        .with_conclusion(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use checker_diagnostics::{ClientPayload, LintMessage, LintResult, NativeDiagnostic};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// An in-memory checker with canned per-file results.
    #[derive(Default)]
    struct FakeRunner {
        project: Vec<LintResult>,
        files: Mutex<HashMap<Utf8PathBuf, Option<LintResult>>>,
        project_calls: AtomicUsize,
        file_calls: AtomicUsize,
    }

    impl FakeRunner {
        fn set_file(&self, path: &str, result: Option<LintResult>) {
            self.files.lock().unwrap().insert(path.into(), result);
        }
    }

    impl CheckRunner for FakeRunner {
        fn name(&self) -> CheckerName {
            CheckerName::ESLint
        }

        async fn check_project(
            &self,
            _root: &Utf8Path,
        ) -> Result<Vec<NativeDiagnostic>, CheckerError> {
            self.project_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .project
                .iter()
                .cloned()
                .map(NativeDiagnostic::LintRule)
                .collect())
        }

        async fn check_file(
            &self,
            _root: &Utf8Path,
            file: &Utf8Path,
        ) -> Result<Vec<NativeDiagnostic>, CheckerError> {
            self.file_calls.fetch_add(1, Ordering::SeqCst);
            match self.files.lock().unwrap().get(file).cloned().flatten() {
                Some(result) => Ok(vec![NativeDiagnostic::LintRule(result)]),
                None => Err(CheckerError::ProcessFailed {
                    program: "eslint".to_string(),
                    code: 2,
                    stderr: "Oops! Something went wrong!".to_string(),
                }),
            }
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        lines: Vec<String>,
        payloads: Vec<ClientPayload>,
    }

    impl ReportSink for RecordingSink {
        fn write_line(&mut self, line: String) {
            self.lines.push(line);
        }

        fn post_overlay(&mut self, payload: ClientPayload) {
            self.payloads.push(payload);
        }
    }

    fn lint(file: &str, severities: &[u8]) -> LintResult {
        LintResult {
            file_path: file.to_string(),
            messages: severities
                .iter()
                .map(|&severity| LintMessage {
                    rule_id: Some("no-undef".to_string()),
                    severity,
                    message: "'foo' is not defined.".to_string(),
                    line: Some(1),
                    column: Some(1),
                    end_line: Some(1),
                    end_column: Some(4),
                })
                .collect(),
            source: Some("foo();".to_string()),
        }
    }

    fn controller(runner: FakeRunner) -> WatchController<FakeRunner> {
        let reporter = Reporter::new(CheckerName::ESLint).with_color(false);
        WatchController::new(runner, "/app", reporter)
    }

    #[tokio::test]
    async fn test_initial_check_single_error() {
        let runner = FakeRunner {
            project: vec![lint("/app/a.js", &[2])],
            ..Default::default()
        };
        let mut controller = controller(runner);
        let mut sink = RecordingSink::default();

        assert_eq!(controller.state(), ControllerState::Idle);
        let summary = controller.initial_check(&mut sink).await.unwrap();

        assert_eq!(controller.state(), ControllerState::Watching);
        assert_eq!(controller.store().len(), 1);
        assert_eq!(summary, ReportSummary { errors: 1, warnings: 0 });
        assert_eq!(
            sink.lines.last().map(String::as_str),
            Some("[ESLint] Found 1 error and 0 warnings")
        );
        assert_eq!(sink.payloads.len(), 1);
    }

    #[tokio::test]
    async fn test_change_to_clean_file_drops_its_diagnostics() {
        let runner = FakeRunner {
            project: vec![lint("/app/a.js", &[2, 1]), lint("/app/b.js", &[2])],
            ..Default::default()
        };
        runner.set_file("/app/a.js", Some(lint("/app/a.js", &[])));
        let mut controller = controller(runner);
        let mut sink = RecordingSink::default();

        controller.initial_check(&mut sink).await.unwrap();
        assert_eq!(controller.store().len(), 3);

        let summary = controller
            .handle_event(WatchEvent::Change("/app/a.js".into()), &mut sink)
            .await
            .unwrap();

        assert_eq!(controller.store().len(), 1);
        assert_eq!(summary, ReportSummary { errors: 1, warnings: 0 });
    }

    #[tokio::test]
    async fn test_unlink_clears_without_checking() {
        let runner = FakeRunner {
            project: vec![lint("/app/a.js", &[2])],
            ..Default::default()
        };
        let mut controller = controller(runner);
        let mut sink = RecordingSink::default();

        controller.initial_check(&mut sink).await.unwrap();
        let summary = controller
            .handle_event(WatchEvent::Unlink("/app/a.js".into()), &mut sink)
            .await
            .unwrap();

        assert_eq!(summary, ReportSummary::default());
        assert!(controller.store().is_empty());
        assert_eq!(controller.runner.file_calls.load(Ordering::SeqCst), 0);
        assert_eq!(controller.runner.project_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unlink_of_directory_clears_its_files() {
        let runner = FakeRunner {
            project: vec![
                lint("/app/src/components/App.ts", &[2]),
                lint("/app/src/components/nested/Button.ts", &[2, 1]),
                lint("/app/src/main.ts", &[2]),
            ],
            ..Default::default()
        };
        let mut controller = controller(runner);
        let mut sink = RecordingSink::default();

        controller.initial_check(&mut sink).await.unwrap();
        assert_eq!(controller.store().len(), 4);

        let summary = controller
            .handle_event(WatchEvent::Unlink("/app/src/components".into()), &mut sink)
            .await
            .unwrap();

        assert_eq!(summary, ReportSummary { errors: 1, warnings: 0 });
        assert_eq!(controller.store().file_count(), 1);
        assert_eq!(controller.store().get("/app/src/main.ts").len(), 1);
        assert_eq!(controller.runner.file_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_file_check_becomes_diagnostic() {
        let runner = FakeRunner::default();
        let mut controller = controller(runner);
        let mut sink = RecordingSink::default();

        controller.initial_check(&mut sink).await.unwrap();
        controller
            .handle_event(WatchEvent::Change("/app/broken.js".into()), &mut sink)
            .await
            .unwrap();

        let diagnostics = controller.store().get("/app/broken.js");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Some(Severity::Error));
        assert_eq!(diagnostics[0].message, "ESLint could not check this file");
        assert!(diagnostics[0].conclusion.contains("exited with code 2"));
        assert_eq!(controller.state(), ControllerState::Watching);
    }

    #[tokio::test]
    async fn test_events_dropped_while_idle() {
        let mut controller = controller(FakeRunner::default());
        let mut sink = RecordingSink::default();

        let summary = controller
            .handle_event(WatchEvent::Change("/app/a.js".into()), &mut sink)
            .await;

        assert_eq!(summary, None);
        assert!(sink.lines.is_empty());
        assert_eq!(controller.runner.file_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_events_applied_in_order() {
        let runner = FakeRunner::default();
        runner.set_file("/app/a.js", Some(lint("/app/a.js", &[2, 2])));
        let mut controller = controller(runner);
        let mut sink = RecordingSink::default();
        controller.initial_check(&mut sink).await.unwrap();

        for event in [
            WatchEvent::Change("/app/a.js".into()),
            WatchEvent::Unlink("/app/a.js".into()),
            WatchEvent::Change("/app/a.js".into()),
        ] {
            controller.handle_event(event, &mut sink).await;
        }

        assert_eq!(controller.store().get("/app/a.js").len(), 2);
        assert_eq!(sink.payloads.len(), 4);
    }
}
