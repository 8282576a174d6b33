//! Native diagnostic shapes, one per checker kind.
//!
//! Field names follow each tool's JSON output so the records deserialize
//! directly from `--format json` style output.

use serde::Deserialize;

/// A native diagnostic record tagged with the kind of checker that produced it.
#[derive(Debug, Clone)]
pub enum NativeDiagnostic {
    /// A compiler diagnostic (TypeScript).
    Compiler(CompilerDiagnostic),
    /// One lint result per file (ESLint).
    LintRule(LintResult),
    /// One style-lint result per file (Stylelint).
    StyleRule(StyleResult),
    /// A `textDocument/publishDiagnostics` notification.
    LanguageServer(PublishDiagnosticsParams),
}

impl NativeDiagnostic {
    /// Returns the file this record belongs to, if it names one.
    pub fn file_id(&self) -> Option<&str> {
        match self {
            NativeDiagnostic::Compiler(d) => d.file_name.as_deref(),
            NativeDiagnostic::LintRule(r) => Some(&r.file_path),
            NativeDiagnostic::StyleRule(r) => r.source.as_deref(),
            NativeDiagnostic::LanguageServer(p) => Some(&p.uri),
        }
    }
}

/// A compiler diagnostic.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerDiagnostic {
    /// Absolute path of the file, absent for global diagnostics.
    pub file_name: Option<String>,
    /// Full text of the file, used to convert offsets and render the frame.
    #[serde(default)]
    pub file_text: Option<String>,
    /// Byte offset of the start of the range.
    pub start: Option<u32>,
    /// Length of the range in bytes.
    pub length: Option<u32>,
    /// The message, possibly a chain of nested messages.
    pub message_text: MessageText,
    /// The compiler's diagnostic category.
    pub category: u8,
    /// The compiler's diagnostic code, e.g. `2322`.
    pub code: u32,
}

/// A compiler message: either plain text or a chain.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MessageText {
    /// A single message.
    Text(String),
    /// A message with nested elaborations.
    Chain(MessageChain),
}

impl From<&str> for MessageText {
    fn from(text: &str) -> Self {
        MessageText::Text(text.to_string())
    }
}

/// A node of a nested compiler message.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageChain {
    /// The text of this node.
    pub message_text: String,
    /// Elaborations, rendered indented below this node.
    #[serde(default)]
    pub next: Vec<MessageChain>,
}

impl MessageChain {
    /// Creates a chain node without elaborations.
    pub fn new(message_text: impl Into<String>) -> Self {
        Self {
            message_text: message_text.into(),
            next: Vec::new(),
        }
    }
}

/// A lint result for one file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LintResult {
    /// Absolute path of the linted file.
    pub file_path: String,
    /// The messages reported for the file.
    pub messages: Vec<LintMessage>,
    /// The file text, present when the linter includes it.
    #[serde(default)]
    pub source: Option<String>,
}

/// A single lint message.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LintMessage {
    /// The rule that produced the message; absent for parse errors.
    pub rule_id: Option<String>,
    /// `0` off, `1` warn, `2` error.
    pub severity: u8,
    /// The message text.
    pub message: String,
    /// 1-indexed line.
    pub line: Option<u32>,
    /// 1-indexed column.
    pub column: Option<u32>,
    /// 1-indexed end line.
    pub end_line: Option<u32>,
    /// 1-indexed end column.
    pub end_column: Option<u32>,
}

/// A style-lint result for one file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleResult {
    /// Absolute path of the linted file.
    pub source: Option<String>,
    /// The warnings reported for the file.
    pub warnings: Vec<StyleWarning>,
    /// The file text; not part of the tool output, filled in by the runner.
    #[serde(skip)]
    pub css: Option<String>,
}

/// A single style-lint warning.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleWarning {
    /// 1-indexed line.
    pub line: u32,
    /// 1-indexed column.
    pub column: u32,
    /// 1-indexed end line.
    pub end_line: Option<u32>,
    /// 1-indexed end column.
    pub end_column: Option<u32>,
    /// The rule that produced the warning.
    pub rule: String,
    /// `"warning"` or `"error"`.
    pub severity: String,
    /// The warning text.
    pub text: String,
}

/// Parameters of a `textDocument/publishDiagnostics` notification.
#[derive(Debug, Clone, Deserialize)]
pub struct PublishDiagnosticsParams {
    /// The document URI.
    pub uri: String,
    /// The diagnostics for the document.
    pub diagnostics: Vec<LspDiagnostic>,
}

/// A language server diagnostic.
#[derive(Debug, Clone, Deserialize)]
pub struct LspDiagnostic {
    /// The range the diagnostic applies to.
    pub range: LspRange,
    /// `1` error, `2` warning, `3` information, `4` hint.
    pub severity: Option<u8>,
    /// The tool that produced it, e.g. `ts`.
    pub source: Option<String>,
    /// The message text.
    pub message: String,
}

/// A 0-based range.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LspRange {
    /// Start position.
    pub start: LspPosition,
    /// End position.
    pub end: LspPosition,
}

/// A 0-based position.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LspPosition {
    /// 0-indexed line.
    pub line: u32,
    /// 0-indexed character.
    pub character: u32,
}
