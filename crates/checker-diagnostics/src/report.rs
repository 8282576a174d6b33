//! Terminal and overlay reporting.

use crate::diagnostic::{CheckerName, Severity, UnifiedDiagnostic};
use crate::filter::{count_severity, filter_by_severity};
use crate::payload::ClientPayload;
use crate::store::DiagnosticStore;
use nu_ansi_term::{Color, Style};

/// Destination of a report.
pub trait ReportSink {
    /// Writes one terminal entry; may contain embedded newlines.
    fn write_line(&mut self, line: String);

    /// Posts one overlay payload.
    fn post_overlay(&mut self, payload: ClientPayload);
}

/// Error and warning counts of one report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportSummary {
    /// Number of reported errors.
    pub errors: usize,
    /// Number of reported warnings.
    pub warnings: usize,
}

/// Filters a checker's diagnostics and formats them for the terminal and the
/// overlay.
#[derive(Debug, Clone)]
pub struct Reporter {
    checker: CheckerName,
    levels: Option<Vec<Severity>>,
    terminal: bool,
    overlay: bool,
    color: bool,
}

impl Reporter {
    /// Creates a reporter with both outputs on and no severity filter.
    pub fn new(checker: CheckerName) -> Self {
        Self {
            checker,
            levels: None,
            terminal: true,
            overlay: true,
            color: true,
        }
    }

    /// Restricts the reported severities. An empty list reports nothing.
    pub fn with_levels(mut self, levels: Option<Vec<Severity>>) -> Self {
        self.levels = levels;
        self
    }

    /// Enables or disables terminal output.
    pub fn with_terminal(mut self, terminal: bool) -> Self {
        self.terminal = terminal;
        self
    }

    /// Enables or disables overlay output.
    pub fn with_overlay(mut self, overlay: bool) -> Self {
        self.overlay = overlay;
        self
    }

    /// Enables or disables ANSI styling in terminal output.
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Returns the checker this reporter belongs to.
    pub fn checker(&self) -> CheckerName {
        self.checker
    }

    /// Reports the current contents of `store`.
    pub fn report(&self, store: &DiagnosticStore, sink: &mut impl ReportSink) -> ReportSummary {
        let all = store.flatten();
        let diagnostics = filter_by_severity(all.iter().copied(), self.levels.as_deref());
        let summary = ReportSummary {
            errors: count_severity(&diagnostics, Severity::Error),
            warnings: count_severity(&diagnostics, Severity::Warning),
        };

        tracing::debug!(
            checker = %self.checker,
            total = all.len(),
            reported = diagnostics.len(),
            "reporting diagnostics"
        );

        if self.terminal {
            for diagnostic in &diagnostics {
                sink.write_line(terminal_block(diagnostic, self.color));
            }
            sink.write_line(summary_line(self.checker, summary, self.color));
        }

        if self.overlay {
            sink.post_overlay(ClientPayload::new(self.checker, diagnostics));
        }

        summary
    }
}

fn label_background(severity: Severity) -> Color {
    match severity {
        Severity::Error => Color::LightRed,
        Severity::Warning => Color::LightYellow,
        Severity::Suggestion => Color::LightBlue,
        Severity::Message => Color::LightCyan,
    }
}

fn paint(style: Style, text: &str, color: bool) -> String {
    if color {
        style.paint(text).to_string()
    } else {
        text.to_string()
    }
}

/// Formats one diagnostic as a terminal block.
///
/// The block holds the severity label with the checker name and the message,
/// the `FILE` label with `path:line:column`, the code frame and the
/// conclusion. Missing parts are left out.
pub fn terminal_block(d: &UnifiedDiagnostic, color: bool) -> String {
    let severity = d.severity.unwrap_or(Severity::Error);
    let label_style = Color::Black.bold().on(label_background(severity));
    let label = format!(" {}({}) ", severity.label(), d.checker);

    let mut parts = vec![format!(
        "{} {}",
        paint(label_style, &label, color),
        d.message
    )];

    if let Some(file) = &d.file_id {
        let position = d
            .location
            .map(|loc| {
                let yellow = Style::new().fg(Color::Yellow);
                format!(
                    ":{}:{}",
                    paint(yellow, &loc.start_line.to_string(), color),
                    paint(yellow, &loc.start_column.to_string(), color)
                )
            })
            .unwrap_or_default();
        let file_label = paint(Color::Black.bold().on(Color::LightCyan), " FILE ", color);
        parts.push(format!("{file_label} {file}{position}\n"));
    }

    let frame = if color {
        d.code_frame.as_deref()
    } else {
        d.stripped_code_frame.as_deref()
    };
    if let Some(frame) = frame {
        parts.push(format!("{frame}\n"));
    }

    if !d.conclusion.is_empty() {
        parts.push(d.conclusion.clone());
    }

    parts.join("\n")
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

/// Formats the unstyled summary, e.g. `[ESLint] Found 1 error and 0 warnings`.
pub fn summary_message(checker: CheckerName, summary: ReportSummary) -> String {
    format!(
        "[{}] Found {} and {}",
        checker,
        plural(summary.errors, "error"),
        plural(summary.warnings, "warning")
    )
}

/// Returns the summary color: red with errors, yellow with only warnings,
/// green otherwise.
pub fn summary_color(summary: ReportSummary) -> Color {
    if summary.errors > 0 {
        Color::Red
    } else if summary.warnings > 0 {
        Color::Yellow
    } else {
        Color::Green
    }
}

/// Formats the summary line, colored when `color` is set.
pub fn summary_line(checker: CheckerName, summary: ReportSummary, color: bool) -> String {
    paint(
        Style::new().fg(summary_color(summary)),
        &summary_message(checker, summary),
        color,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use code_frame::Location;
    use pretty_assertions::assert_eq;

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

    fn error_store() -> DiagnosticStore {
        let mut store = DiagnosticStore::new();
        store.init_with(vec![UnifiedDiagnostic::new(
            CheckerName::ESLint,
            "'foo' is not defined. (no-undef)",
        )
        .with_file("/app/src/main.js")
        .with_severity(Severity::Error)
        .with_location(Location::new(1, 1, 1, 4), "foo();")]);
        store
    }

    #[test]
    fn test_single_error_summary_is_red() {
        let store = error_store();
        let reporter = Reporter::new(CheckerName::ESLint);
        let mut sink = RecordingSink::default();

        let summary = reporter.report(&store, &mut sink);

        assert_eq!(summary, ReportSummary { errors: 1, warnings: 0 });
        assert_eq!(summary_color(summary), Color::Red);
        insta::assert_snapshot!(
            summary_message(CheckerName::ESLint, summary),
            @"[ESLint] Found 1 error and 0 warnings"
        );
        assert_eq!(
            sink.lines.last(),
            Some(&Color::Red.paint("[ESLint] Found 1 error and 0 warnings").to_string())
        );
    }

    #[test]
    fn test_summary_pluralization_and_color() {
        let summary = ReportSummary { errors: 0, warnings: 2 };
        insta::assert_snapshot!(
            summary_message(CheckerName::Stylelint, summary),
            @"[Stylelint] Found 0 errors and 2 warnings"
        );
        assert_eq!(summary_color(summary), Color::Yellow);
        assert_eq!(summary_color(ReportSummary::default()), Color::Green);
    }

    #[test]
    fn test_plain_terminal_block() {
        let store = error_store();
        let diagnostic = store.flatten()[0];

        let block = terminal_block(diagnostic, false);
        assert_eq!(
            block,
            " ERROR(ESLint)  'foo' is not defined. (no-undef)\n \
             FILE  /app/src/main.js:1:1\n\n  > 1 | foo();\n      | ^^^\n"
        );
    }

    #[test]
    fn test_block_includes_conclusion() {
        let diagnostic = UnifiedDiagnostic::new(CheckerName::TypeScript, "check failed")
            .with_severity(Severity::Error)
            .with_conclusion("tsc exited with status 2");
        let block = terminal_block(&diagnostic, false);
        assert!(block.ends_with("tsc exited with status 2"));
        assert!(!block.contains("FILE"));
    }

    #[test]
    fn test_empty_overlay_payload_is_still_posted() {
        let store = DiagnosticStore::new();
        let reporter = Reporter::new(CheckerName::Stylelint).with_terminal(false);
        let mut sink = RecordingSink::default();

        reporter.report(&store, &mut sink);

        assert!(sink.lines.is_empty());
        assert_eq!(sink.payloads.len(), 1);
        assert!(sink.payloads[0].data.diagnostics.is_empty());
        assert_eq!(sink.payloads[0].data.checker_id, "stylelint");
    }

    #[test]
    fn test_empty_levels_report_nothing() {
        let store = error_store();
        let reporter = Reporter::new(CheckerName::ESLint)
            .with_levels(Some(Vec::new()))
            .with_color(false);
        let mut sink = RecordingSink::default();

        let summary = reporter.report(&store, &mut sink);

        assert_eq!(summary, ReportSummary::default());
        assert_eq!(sink.lines, vec!["[ESLint] Found 0 errors and 0 warnings"]);
        assert!(sink.payloads[0].data.diagnostics.is_empty());
    }

    #[test]
    fn test_overlay_disabled() {
        let store = error_store();
        let reporter = Reporter::new(CheckerName::ESLint)
            .with_overlay(false)
            .with_color(false);
        let mut sink = RecordingSink::default();

        reporter.report(&store, &mut sink);

        assert!(sink.payloads.is_empty());
        assert_eq!(sink.lines.len(), 2);
    }
}
