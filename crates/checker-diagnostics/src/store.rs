//! Per-file diagnostic store.

use crate::diagnostic::UnifiedDiagnostic;
use indexmap::IndexMap;

/// The current diagnostics of one checker, keyed by file id.
///
/// Diagnostics without a file id live under the `None` key and are only ever
/// replaced by [`DiagnosticStore::init_with`].
#[derive(Debug, Default)]
pub struct DiagnosticStore {
    files: IndexMap<Option<String>, Vec<UnifiedDiagnostic>>,
}

impl DiagnosticStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole store with a full-project result.
    pub fn init_with(&mut self, diagnostics: Vec<UnifiedDiagnostic>) {
        self.files.clear();
        for diagnostic in diagnostics {
            self.files
                .entry(diagnostic.file_id.clone())
                .or_default()
                .push(diagnostic);
        }
    }

    /// Replaces the diagnostics of one file.
    ///
    /// An empty list removes the file's entry.
    pub fn update_for_file(&mut self, file_id: &str, diagnostics: Vec<UnifiedDiagnostic>) {
        let key = Some(file_id.to_string());
        if diagnostics.is_empty() {
            self.files.shift_remove(&key);
        } else {
            self.files.insert(key, diagnostics);
        }
    }

    /// Removes the diagnostics of every file below directory `dir`.
    ///
    /// Returns the number of files removed.
    pub fn remove_under(&mut self, dir: &str) -> usize {
        let prefix = format!("{}/", dir.trim_end_matches('/'));
        let before = self.files.len();
        self.files.retain(|file_id, _| {
            !file_id
                .as_deref()
                .is_some_and(|file_id| file_id.starts_with(&prefix))
        });
        before - self.files.len()
    }

    /// Returns every diagnostic across all files.
    pub fn flatten(&self) -> Vec<&UnifiedDiagnostic> {
        self.files.values().flatten().collect()
    }

    /// Returns the diagnostics of one file.
    pub fn get(&self, file_id: &str) -> &[UnifiedDiagnostic] {
        self.files
            .get(&Some(file_id.to_string()))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns the number of files with at least one diagnostic.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Returns the total number of diagnostics.
    pub fn len(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    /// Returns true if the store holds no diagnostics.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
