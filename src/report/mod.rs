//! Extraction diagnostics and batch summaries.
//!
//! Per-atlas warnings (clamped geometry, failed encodes) are collected into a
//! [`Report`]; the batch runner folds per-atlas outcomes into a
//! [`BatchSummary`] that the CLI prints at the end of a run.

mod diagnostic;
mod summary;

pub use diagnostic::{
    Diagnostic, Report, Severity, ANIMATION_FAILED, EMPTY_SELECTION, FRAME_FAILED,
    GEOMETRY_CLAMPED,
};
pub use summary::{AtlasOutcome, AtlasStats, BatchSummary};

use crate::output::Printer;

/// Print diagnostics to stderr, one per line.
pub fn print_diagnostics(printer: &Printer, report: &Report) {
    for d in report.iter() {
        let label = printer.severity(&d.severity.to_string(), d.severity == Severity::Error);
        match &d.subject {
            Some(subject) => eprintln!("  {}[{}]: {}: {}", label, d.code, subject, d.message),
            None => eprintln!("  {}[{}]: {}", label, d.code, d.message),
        }
        if let Some(help) = &d.help {
            eprintln!("    help: {}", help);
        }
    }
}
