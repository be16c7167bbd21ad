//! Diagnostic aggregation.

use crate::types::{Diagnostic, LintResult, Summary};

/// Collects diagnostics from every producer of a pass and publishes them in
/// one deterministic order.
#[derive(Debug, Default)]
pub struct Reporter {
    diagnostics: Vec<Diagnostic>,
    files_checked: usize,
    files_excluded: usize,
}

impl Reporter {
    /// Creates an empty reporter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds diagnostics.
    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    /// Records the file counts of the pass.
    pub fn set_file_counts(&mut self, checked: usize, excluded: usize) {
        self.files_checked = checked;
        self.files_excluded = excluded;
    }

    /// Sorts by `(file, offset, rule, message)`, drops exact duplicates and
    /// computes the summary.
    #[must_use]
    pub fn finish(mut self) -> LintResult {
        self.diagnostics.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        self.diagnostics.dedup();
        let summary = Summary::of(&self.diagnostics);
        LintResult {
            diagnostics: self.diagnostics,
            files_checked: self.files_checked,
            files_excluded: self.files_excluded,
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Location, Severity, Span};
    use std::path::PathBuf;

    fn diag(file: &str, offset: usize, rule: &str, severity: Severity) -> Diagnostic {
        Diagnostic::new(
            "CA000",
            rule,
            severity,
            Location::new(PathBuf::from(file), 1, offset + 1).with_span(Span::new(offset, 1)),
            format!("{rule} at {offset}"),
        )
    }

    #[test]
    fn orders_by_file_offset_rule() {
        let mut reporter = Reporter::new();
        reporter.extend([
            diag("lib/b.dart", 0, "a-rule", Severity::Error),
            diag("lib/a.dart", 10, "a-rule", Severity::Error),
            diag("lib/a.dart", 2, "z-rule", Severity::Warning),
            diag("lib/a.dart", 2, "b-rule", Severity::Info),
        ]);
        let result = reporter.finish();
        let order: Vec<_> = result
            .diagnostics
            .iter()
            .map(|d| (d.location.file.to_string_lossy().into_owned(), d.location.offset, d.rule.clone()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("lib/a.dart".to_string(), 2, "b-rule".to_string()),
                ("lib/a.dart".to_string(), 2, "z-rule".to_string()),
                ("lib/a.dart".to_string(), 10, "a-rule".to_string()),
                ("lib/b.dart".to_string(), 0, "a-rule".to_string()),
            ]
        );
    }

    #[test]
    fn duplicates_are_dropped_and_summary_counts() {
        let mut reporter = Reporter::new();
        reporter.extend([
            diag("lib/a.dart", 0, "x", Severity::Error),
            diag("lib/a.dart", 0, "x", Severity::Error),
            diag("lib/a.dart", 4, "y", Severity::Warning),
        ]);
        reporter.set_file_counts(3, 1);
        let result = reporter.finish();
        assert_eq!(result.diagnostics.len(), 2);
        assert_eq!(result.summary.errors, 1);
        assert_eq!(result.summary.warnings, 1);
        assert_eq!(result.summary.by_rule.get("x"), Some(&1));
        assert_eq!(result.files_checked, 3);
        assert_eq!(result.files_excluded, 1);
    }
}
