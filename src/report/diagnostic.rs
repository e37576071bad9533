//! Non-fatal diagnostics collected while extracting an atlas.

use std::fmt;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Diagnostic code for a region clamped to the atlas bounds.
pub const GEOMETRY_CLAMPED: &str = "unatlas::geometry::clamped";
/// Diagnostic code for an animation that could not be encoded.
pub const ANIMATION_FAILED: &str = "unatlas::export::animation";
/// Diagnostic code for a frame file that could not be written.
pub const FRAME_FAILED: &str = "unatlas::export::frame";
/// Diagnostic code for an animation whose selection kept nothing.
pub const EMPTY_SELECTION: &str = "unatlas::select::empty";

/// A single diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Machine-readable code (e.g. "unatlas::geometry::clamped").
    pub code: String,
    pub message: String,
    /// Sprite or animation the diagnostic is about.
    pub subject: Option<String>,
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code: code.into(),
            message: message.into(),
            subject: None,
            help: None,
        }
    }

    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code: code.into(),
            message: message.into(),
            subject: None,
            help: None,
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: ", self.severity, self.code)?;
        if let Some(subject) = &self.subject {
            write!(f, "{}: ", subject)?;
        }
        write!(f, "{}", self.message)
    }
}

/// Diagnostics gathered for one atlas.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    diagnostics: Vec<Diagnostic>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn error(&mut self, code: impl Into<String>, message: impl Into<String>) {
        self.push(Diagnostic::error(code, message));
    }

    pub fn warning(&mut self, code: impl Into<String>, message: impl Into<String>) {
        self.push(Diagnostic::warning(code, message));
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    /// Number of diagnostics with the given code.
    pub fn count_code(&self, code: &str) -> usize {
        self.diagnostics.iter().filter(|d| d.code == code).count()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn merge(&mut self, other: Report) {
        self.diagnostics.extend(other.diagnostics);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report() {
        let report = Report::new();
        assert!(report.is_empty());
        assert!(!report.has_errors());
        assert_eq!(report.warning_count(), 0);
    }

    #[test]
    fn test_counts_and_merge() {
        let mut a = Report::new();
        a.warning(GEOMETRY_CLAMPED, "region clamped");

        let mut b = Report::new();
        b.error(ANIMATION_FAILED, "encoder failed");
        b.warning(GEOMETRY_CLAMPED, "region clamped");

        a.merge(b);
        assert_eq!(a.warning_count(), 2);
        assert_eq!(a.error_count(), 1);
        assert_eq!(a.count_code(GEOMETRY_CLAMPED), 2);
        assert!(a.has_errors());
    }

    #[test]
    fn test_display_includes_subject() {
        let d = Diagnostic::warning(GEOMETRY_CLAMPED, "region exceeds atlas").with_subject("Walk0003");
        assert_eq!(
            d.to_string(),
            "warning[unatlas::geometry::clamped]: Walk0003: region exceeds atlas"
        );
    }
}
