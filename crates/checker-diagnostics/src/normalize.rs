//! Conversion of native records into [`UnifiedDiagnostic`]s.

use crate::diagnostic::{CheckerName, Severity, UnifiedDiagnostic};
use crate::native::{
    CompilerDiagnostic, LintResult, LspDiagnostic, MessageChain, MessageText, NativeDiagnostic,
    PublishDiagnosticsParams, StyleResult,
};
use camino::Utf8PathBuf;
use code_frame::{LineCol, LineIndex, Location};
use thiserror::Error;

/// Errors raised while normalizing a native record.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// The referenced file could not be read to build a code frame.
    #[error("could not normalize: file unreadable: {path}")]
    Unreadable {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document URI does not name a local file.
    #[error("could not normalize: `{0}` is not a file uri")]
    InvalidUri(String),

    /// The compiler reported a category outside the known four.
    #[error("could not normalize: unknown compiler category {0}")]
    UnknownCategory(u8),
}

/// Normalizes one native record.
///
/// Lint and style records expand to one diagnostic per message, minus the
/// messages whose severity is switched off or unrecognized.
pub fn normalize(native: &NativeDiagnostic) -> Result<Vec<UnifiedDiagnostic>, NormalizeError> {
    match native {
        NativeDiagnostic::Compiler(d) => normalize_compiler(d).map(|d| vec![d]),
        NativeDiagnostic::LintRule(r) => Ok(normalize_lint(r)),
        NativeDiagnostic::StyleRule(r) => Ok(normalize_style(r)),
        NativeDiagnostic::LanguageServer(p) => normalize_publish_params(p),
    }
}

/// Normalizes a batch, dropping every record that fails to normalize.
pub fn normalize_all(batch: impl IntoIterator<Item = NativeDiagnostic>) -> Vec<UnifiedDiagnostic> {
    let mut diagnostics = Vec::new();

    for native in batch {
        match normalize(&native) {
            Ok(normalized) => diagnostics.extend(normalized),
            Err(e) => {
                tracing::warn!(
                    file = native.file_id().unwrap_or("<none>"),
                    error = %e,
                    "dropping diagnostic"
                );
            }
        }
    }

    diagnostics
}

/// Flattens a compiler message chain into one string.
///
/// Each elaboration goes on its own line, indented two spaces per level.
pub fn flatten_message_text(text: &MessageText) -> String {
    match text {
        MessageText::Text(text) => text.clone(),
        MessageText::Chain(chain) => {
            let mut out = String::new();
            flatten_chain(chain, 0, &mut out);
            out
        }
    }
}

fn flatten_chain(chain: &MessageChain, indent: usize, out: &mut String) {
    if indent > 0 {
        out.push('\n');
        out.push_str(&"  ".repeat(indent));
    }
    out.push_str(&chain.message_text);

    for next in &chain.next {
        flatten_chain(next, indent + 1, out);
    }
}

fn normalize_compiler(d: &CompilerDiagnostic) -> Result<UnifiedDiagnostic, NormalizeError> {
    let severity = Severity::from_compiler_category(d.category)
        .ok_or(NormalizeError::UnknownCategory(d.category))?;

    let message = flatten_message_text(&d.message_text);
    let mut diagnostic =
        UnifiedDiagnostic::new(CheckerName::TypeScript, message).with_severity(severity);

    if let Some(file_name) = &d.file_name {
        diagnostic = diagnostic.with_file(file_name.clone());
    }

    if let (Some(start), Some(length), Some(text)) = (d.start, d.length, d.file_text.as_deref()) {
        if let Some(location) = LineIndex::new(text).location(start, length) {
            diagnostic = diagnostic.with_location(location, text);
        }
    }

    Ok(diagnostic)
}

fn normalize_lint(result: &LintResult) -> Vec<UnifiedDiagnostic> {
    let source = result.source.as_deref().unwrap_or("");

    result
        .messages
        .iter()
        .filter_map(|m| {
            let severity = match m.severity {
                1 => Severity::Warning,
                2 => Severity::Error,
                // 0 is "off": the rule is a no-op, not a suppressed error
                _ => return None,
            };

            let message = match &m.rule_id {
                Some(rule) => format!("{} ({})", m.message, rule),
                None => m.message.clone(),
            };

            let mut diagnostic = UnifiedDiagnostic::new(CheckerName::ESLint, message)
                .with_file(result.file_path.clone())
                .with_severity(severity);

            if let Some(line) = m.line {
                let location = Location::new(
                    line,
                    m.column.unwrap_or(0),
                    m.end_line.unwrap_or(0),
                    m.end_column.unwrap_or(0),
                );
                diagnostic = diagnostic.with_location(location, source);
            }

            Some(diagnostic)
        })
        .collect()
}

fn normalize_style(result: &StyleResult) -> Vec<UnifiedDiagnostic> {
    let css = result.css.as_deref().unwrap_or("");

    result
        .warnings
        .iter()
        .filter_map(|w| {
            let severity = match w.severity.as_str() {
                "warning" => Severity::Warning,
                "error" => Severity::Error,
                _ => return None,
            };

            let location = Location::new(
                w.line,
                w.column,
                w.end_line.unwrap_or(0),
                w.end_column.unwrap_or(0),
            );

            let mut diagnostic =
                UnifiedDiagnostic::new(CheckerName::Stylelint, format!("{} ({})", w.text, w.rule))
                    .with_severity(severity)
                    .with_location(location, css);
            if let Some(source) = &result.source {
                diagnostic = diagnostic.with_file(source.clone());
            }

            Some(diagnostic)
        })
        .collect()
}

fn normalize_publish_params(
    params: &PublishDiagnosticsParams,
) -> Result<Vec<UnifiedDiagnostic>, NormalizeError> {
    let path = uri_to_path(&params.uri)?;
    let text = std::fs::read_to_string(&path).map_err(|source| NormalizeError::Unreadable {
        path: path.clone(),
        source,
    })?;

    Ok(params
        .diagnostics
        .iter()
        .map(|d| normalize_lsp(d, path.as_str(), &text))
        .collect())
}

fn normalize_lsp(d: &LspDiagnostic, file: &str, text: &str) -> UnifiedDiagnostic {
    let severity = match d.severity {
        Some(2) => Severity::Warning,
        Some(3) => Severity::Message,
        Some(4) => Severity::Suggestion,
        _ => Severity::Error,
    };

    let location = Location::from_zero_based(
        LineCol::new(d.range.start.line, d.range.start.character),
        LineCol::new(d.range.end.line, d.range.end.character),
    );

    UnifiedDiagnostic::new(CheckerName::Lsp, d.message.trim())
        .with_file(file)
        .with_severity(severity)
        .with_location(location, text)
}

fn uri_to_path(uri: &str) -> Result<Utf8PathBuf, NormalizeError> {
    let url = url::Url::parse(uri).map_err(|_| NormalizeError::InvalidUri(uri.to_string()))?;
    let path = url
        .to_file_path()
        .map_err(|()| NormalizeError::InvalidUri(uri.to_string()))?;
    Utf8PathBuf::try_from(path).map_err(|_| NormalizeError::InvalidUri(uri.to_string()))
}
