//! Diagnostics collected while checking a problem instance.
//!
//! Instance checks never stop at the first problem: every issue is recorded
//! with a severity, a category and an optional entity reference so that a
//! caller can print the whole list at once. Errors make an instance unusable
//! (the model builders would reference missing indices); warnings flag data
//! that breaks a caller contract the algorithm relies on but does not police,
//! such as probabilities that do not sum to one.
//!
//! # Example
//!
//! ```
//! use cpt_core::diagnostics::{Diagnostics, Severity};
//!
//! let mut diag = Diagnostics::new();
//! diag.add_warning("probability", "scenario probabilities sum to 0.9");
//! diag.add_error_with_entity("reference", "arc targets unknown router", "arc 2");
//!
//! assert_eq!(diag.warning_count(), 1);
//! assert_eq!(diag.error_count(), 1);
//! ```

use serde::Serialize;

/// Severity level for diagnostic issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Suspicious data; the run may still succeed
    Warning,
    /// The instance cannot be turned into a model
    Error,
}

/// A single diagnostic issue
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticIssue {
    pub severity: Severity,
    /// Category for grouping (e.g. "reference", "dimension", "probability")
    pub category: String,
    pub message: String,
    /// Optional entity reference (e.g. "scenario 1", "arc 4")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl DiagnosticIssue {
    pub fn new(
        severity: Severity,
        category: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category: category.into(),
            message: message.into(),
            entity: None,
        }
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }
}

impl std::fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };

        write!(f, "[{}:{}] {}", severity, self.category, self.message)?;

        if let Some(entity) = &self.entity {
            write!(f, " ({})", entity)?;
        }

        Ok(())
    }
}

/// Collection of diagnostic issues
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, issue: DiagnosticIssue) {
        self.issues.push(issue);
    }

    pub fn add_warning(&mut self, category: &str, message: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, category, message));
    }

    pub fn add_warning_with_entity(&mut self, category: &str, message: &str, entity: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, category, message).with_entity(entity));
    }

    pub fn add_error_with_entity(&mut self, category: &str, message: &str, entity: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Error, category, message).with_entity(entity));
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
    }

    /// Issues of one category, in insertion order
    pub fn issues_by_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a DiagnosticIssue> + 'a {
        self.issues.iter().filter(move |i| i.category == category)
    }

    pub fn merge(&mut self, other: Diagnostics) {
        self.issues.extend(other.issues);
    }

    /// One-line summary, e.g. "2 errors, 1 warning"
    pub fn summary(&self) -> String {
        let errors = self.error_count();
        let warnings = self.warning_count();
        format!(
            "{} error{}, {} warning{}",
            errors,
            if errors == 1 { "" } else { "s" },
            warnings,
            if warnings == 1 { "" } else { "s" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostics_counts() {
        let mut diag = Diagnostics::new();
        diag.add_warning("probability", "sum is 0.5");
        diag.add_warning("cost", "negative cost");
        diag.add_error_with_entity("dimension", "demand table has 3 rows", "scenario 0");

        assert_eq!(diag.warning_count(), 2);
        assert_eq!(diag.error_count(), 1);
        assert!(diag.has_errors());
    }

    #[test]
    fn test_diagnostic_issue_display() {
        let issue = DiagnosticIssue::new(Severity::Error, "reference", "unknown router 4")
            .with_entity("arc 1");
        assert_eq!(issue.to_string(), "[error:reference] unknown router 4 (arc 1)");
    }

    #[test]
    fn test_diagnostics_summary() {
        let mut diag = Diagnostics::new();
        assert_eq!(diag.summary(), "0 errors, 0 warnings");
        diag.add_error_with_entity("reference", "x", "arc 0");
        diag.add_warning("cost", "y");
        assert_eq!(diag.summary(), "1 error, 1 warning");
    }

    #[test]
    fn test_issues_by_category_and_merge() {
        let mut a = Diagnostics::new();
        a.add_warning("cost", "negative utilization cost");
        let mut b = Diagnostics::new();
        b.add_warning_with_entity("cost", "negative on-demand cost", "scenario 0");
        b.add_error_with_entity("reference", "unknown user", "arc 0");
        a.merge(b);

        assert_eq!(a.issues_by_category("cost").count(), 2);
        assert_eq!(a.issues_by_category("reference").count(), 1);
    }

    #[test]
    fn test_diagnostics_serialization() {
        let mut diag = Diagnostics::new();
        diag.add_warning("probability", "sum is 0.9");
        let json = serde_json::to_string(&diag).unwrap();
        assert!(json.contains("\"severity\":\"warning\""));
        assert!(!json.contains("entity"));
    }
}
