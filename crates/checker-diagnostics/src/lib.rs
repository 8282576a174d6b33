//! Diagnostic aggregation for dev-checker.
//!
//! This crate provides:
//! - The unified diagnostic model every checker's output is mapped into
//! - The native record shapes of each checker kind and their normalizer
//! - The per-file [`DiagnosticStore`]
//! - Severity filtering and the terminal/overlay [`Reporter`]
//!
//! # Example
//!
//! ```
//! use checker_diagnostics::{
//!     normalize_all, DiagnosticStore, LintMessage, LintResult, NativeDiagnostic,
//! };
//!
//! let result = LintResult {
//!     file_path: "/app/src/main.js".to_string(),
//!     messages: vec![LintMessage {
//!         rule_id: Some("no-undef".to_string()),
//!         severity: 2,
//!         message: "'foo' is not defined.".to_string(),
//!         line: Some(1),
//!         column: Some(1),
//!         end_line: Some(1),
//!         end_column: Some(4),
//!     }],
//!     source: Some("foo();\n".to_string()),
//! };
//!
//! let mut store = DiagnosticStore::new();
//! store.init_with(normalize_all(vec![NativeDiagnostic::LintRule(result)]));
//! assert_eq!(store.flatten().len(), 1);
//! ```

mod diagnostic;
mod filter;
mod native;
mod normalize;
mod payload;
mod report;
mod store;

pub use code_frame::Location;
pub use diagnostic::{CheckerName, Severity, UnifiedDiagnostic};
pub use filter::{count_severity, filter_by_severity};
pub use native::{
    CompilerDiagnostic, LintMessage, LintResult, LspDiagnostic, LspPosition, LspRange,
    MessageChain, MessageText, NativeDiagnostic, PublishDiagnosticsParams, StyleResult,
    StyleWarning,
};
pub use normalize::{flatten_message_text, normalize, normalize_all, NormalizeError};
pub use payload::{
    ClientPayload, ClientPayloadData, RuntimeDiagnostic, RuntimeLocation, OVERLAY_ERROR_EVENT,
};
pub use report::{
    summary_color, summary_line, summary_message, terminal_block, ReportSink, ReportSummary,
    Reporter,
};
pub use store::DiagnosticStore;
