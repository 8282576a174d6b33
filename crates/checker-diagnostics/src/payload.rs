//! Overlay wire format.

use crate::diagnostic::{CheckerName, UnifiedDiagnostic};
use serde::{Deserialize, Serialize};

/// Event name carried by every overlay payload.
pub const OVERLAY_ERROR_EVENT: &str = "dev-checker:error";

/// One overlay update: the complete diagnostic list of one checker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientPayload {
    /// Always [`OVERLAY_ERROR_EVENT`].
    pub event: String,
    /// The update.
    pub data: ClientPayloadData,
}

/// Body of a [`ClientPayload`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientPayloadData {
    /// The checker the list belongs to; replaces its previous list.
    pub checker_id: String,
    /// The diagnostics, possibly empty.
    pub diagnostics: Vec<RuntimeDiagnostic>,
}

/// A diagnostic as shown by the overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeDiagnostic {
    pub message: String,
    pub stack: String,
    pub id: Option<String>,
    /// The code frame without terminal styling.
    pub frame: Option<String>,
    pub checker_id: String,
    pub level: Option<u8>,
    pub loc: Option<RuntimeLocation>,
}

/// Start position of a runtime diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl ClientPayload {
    /// Builds the payload for one checker.
    pub fn new<'a>(
        checker: CheckerName,
        diagnostics: impl IntoIterator<Item = &'a UnifiedDiagnostic>,
    ) -> Self {
        Self {
            event: OVERLAY_ERROR_EVENT.to_string(),
            data: ClientPayloadData {
                checker_id: checker.id().to_string(),
                diagnostics: diagnostics.into_iter().map(RuntimeDiagnostic::from).collect(),
            },
        }
    }
}

impl From<&UnifiedDiagnostic> for RuntimeDiagnostic {
    fn from(d: &UnifiedDiagnostic) -> Self {
        Self {
            message: d.message.clone(),
            stack: d.stack.clone().unwrap_or_default(),
            id: d.file_id.clone(),
            frame: d.stripped_code_frame.clone(),
            checker_id: d.checker.as_str().to_string(),
            level: d.severity.map(|s| s.code()),
            loc: d.location.map(|loc| RuntimeLocation {
                file: d.file_id.clone().unwrap_or_default(),
                line: loc.start_line,
                column: loc.start_column,
            }),
        }
    }
}
