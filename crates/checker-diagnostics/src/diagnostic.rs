//! Diagnostic types.

use code_frame::{CodeFrame, Location};
use serde::{Deserialize, Serialize};

/// The severity of a diagnostic.
///
/// Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// An informational message.
    Message,
    /// A suggestion or hint.
    Suggestion,
    /// A warning that doesn't prevent a build.
    Warning,
    /// An error that should be fixed.
    Error,
}

impl Severity {
    /// All four levels, the default severity filter.
    pub const ALL: [Severity; 4] = [
        Severity::Warning,
        Severity::Error,
        Severity::Suggestion,
        Severity::Message,
    ];

    /// Maps a compiler diagnostic category to a severity.
    ///
    /// The numbering (`0` warning, `1` error, `2` suggestion, `3` message) is
    /// the TypeScript `DiagnosticCategory` enum and is taken as a stable
    /// external contract.
    pub fn from_compiler_category(category: u8) -> Option<Self> {
        match category {
            0 => Some(Severity::Warning),
            1 => Some(Severity::Error),
            2 => Some(Severity::Suggestion),
            3 => Some(Severity::Message),
            _ => None,
        }
    }

    /// Returns the numeric level sent to the overlay.
    ///
    /// Uses the same numbering as [`Severity::from_compiler_category`].
    pub fn code(self) -> u8 {
        match self {
            Severity::Warning => 0,
            Severity::Error => 1,
            Severity::Suggestion => 2,
            Severity::Message => 3,
        }
    }

    /// Returns the upper-case label used in terminal output.
    pub fn label(self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Suggestion => "SUGGESTION",
            Severity::Message => "MESSAGE",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Suggestion => "suggestion",
            Severity::Message => "message",
        };
        f.write_str(name)
    }
}

/// The checker that produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckerName {
    /// The TypeScript compiler.
    TypeScript,
    /// ESLint.
    ESLint,
    /// Stylelint.
    Stylelint,
    /// A language server speaking `textDocument/publishDiagnostics`.
    Lsp,
}

impl CheckerName {
    /// Returns the display name.
    pub fn as_str(self) -> &'static str {
        match self {
            CheckerName::TypeScript => "TypeScript",
            CheckerName::ESLint => "ESLint",
            CheckerName::Stylelint => "Stylelint",
            CheckerName::Lsp => "LSP",
        }
    }

    /// Returns the identifier the overlay groups payloads by.
    pub fn id(self) -> &'static str {
        match self {
            CheckerName::TypeScript => "typescript",
            CheckerName::ESLint => "eslint",
            CheckerName::Stylelint => "stylelint",
            CheckerName::Lsp => "lsp",
        }
    }
}

impl std::fmt::Display for CheckerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A diagnostic in the shape shared by every checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnifiedDiagnostic {
    /// Human-readable description.
    pub message: String,
    /// Trailing note, empty when the checker has none.
    pub conclusion: String,
    /// Raw stack trace text.
    pub stack: Option<String>,
    /// Absolute path or URI of the source file; the store key.
    pub file_id: Option<String>,
    /// The producing checker.
    pub checker: CheckerName,
    /// Code frame with terminal styling.
    pub code_frame: Option<String>,
    /// Code frame without styling.
    pub stripped_code_frame: Option<String>,
    /// Source range.
    pub location: Option<Location>,
    /// Severity, `None` when the checker's level was not recognized.
    pub severity: Option<Severity>,
}

impl UnifiedDiagnostic {
    /// Creates a diagnostic with only a checker and a message.
    pub fn new(checker: CheckerName, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            conclusion: String::new(),
            stack: None,
            file_id: None,
            checker,
            code_frame: None,
            stripped_code_frame: None,
            location: None,
            severity: None,
        }
    }

    /// Sets the file id.
    pub fn with_file(mut self, file_id: impl Into<String>) -> Self {
        self.file_id = Some(file_id.into());
        self
    }

    /// Sets the severity.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Sets the conclusion.
    pub fn with_conclusion(mut self, conclusion: impl Into<String>) -> Self {
        self.conclusion = conclusion.into();
        self
    }

    /// Sets the location and renders both code frames from `text`.
    pub fn with_location(mut self, location: Location, text: &str) -> Self {
        self.location = Some(location);
        self.set_frame(code_frame::render(text, &location));
        self
    }

    fn set_frame(&mut self, frame: Option<CodeFrame>) {
        match frame {
            Some(CodeFrame { styled, plain }) => {
                self.code_frame = Some(styled);
                self.stripped_code_frame = Some(plain);
            }
            None => {
                self.code_frame = None;
                self.stripped_code_frame = None;
            }
        }
    }
}
