//! Severity filtering.

use crate::diagnostic::{Severity, UnifiedDiagnostic};

/// Keeps the diagnostics whose severity is in `levels`.
///
/// `None` allows all four levels; `Some(&[])` allows nothing. Diagnostics
/// without a severity never pass.
pub fn filter_by_severity<'a>(
    diagnostics: impl IntoIterator<Item = &'a UnifiedDiagnostic>,
    levels: Option<&[Severity]>,
) -> Vec<&'a UnifiedDiagnostic> {
    let levels = levels.unwrap_or(&Severity::ALL);

    diagnostics
        .into_iter()
        .filter(|d| d.severity.is_some_and(|s| levels.contains(&s)))
        .collect()
}

/// Counts the diagnostics of one severity.
pub fn count_severity(diagnostics: &[&UnifiedDiagnostic], severity: Severity) -> usize {
    diagnostics
        .iter()
        .filter(|d| d.severity == Some(severity))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::CheckerName;

    fn all_levels() -> Vec<UnifiedDiagnostic> {
        let mut diagnostics: Vec<_> = Severity::ALL
            .iter()
            .map(|&s| UnifiedDiagnostic::new(CheckerName::Lsp, s.to_string()).with_severity(s))
            .collect();
        diagnostics.push(UnifiedDiagnostic::new(CheckerName::Lsp, "unclassified"));
        diagnostics
    }

    #[test]
    fn test_default_allows_all_four_levels() {
        let diagnostics = all_levels();
        let kept = filter_by_severity(&diagnostics, None);
        assert_eq!(kept.len(), 4);
        assert!(kept.iter().all(|d| d.severity.is_some()));
    }

    #[test]
    fn test_empty_levels_allow_nothing() {
        let diagnostics: Vec<_> = (0..50).flat_map(|_| all_levels()).collect();
        assert!(filter_by_severity(&diagnostics, Some(&[])).is_empty());
    }

    #[test]
    fn test_explicit_levels() {
        let diagnostics = all_levels();
        let kept = filter_by_severity(&diagnostics, Some(&[Severity::Error]));
        assert_eq!(kept.len(), 1);
        assert_eq!(count_severity(&kept, Severity::Error), 1);
        assert_eq!(count_severity(&kept, Severity::Warning), 0);
    }
}
