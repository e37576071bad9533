//! Batch outcome accounting.

use std::path::PathBuf;

use crate::error::AtlasError;

use super::Report;

/// What one atlas job produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AtlasStats {
    /// Individual frame files written.
    pub frames: usize,
    /// Encoded animations (and single-frame stills) written.
    pub animations: usize,
    pub report: Report,
}

/// Result of one atlas job.
#[derive(Debug)]
pub enum AtlasOutcome {
    Done(AtlasStats),
    /// Declined at the background prompt.
    Cancelled,
    /// Not started because an earlier job failed under fail-fast.
    Skipped,
    Failed(AtlasError),
}

impl AtlasOutcome {
    pub fn from_result(result: crate::error::Result<AtlasStats>) -> Self {
        match result {
            Ok(stats) => AtlasOutcome::Done(stats),
            Err(e) if e.is_cancelled() => AtlasOutcome::Cancelled,
            Err(e) => AtlasOutcome::Failed(e),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, AtlasOutcome::Failed(_))
    }
}

/// Outcomes for every input, in input order.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub outcomes: Vec<(PathBuf, AtlasOutcome)>,
}

impl BatchSummary {
    fn done(&self) -> impl Iterator<Item = &AtlasStats> {
        self.outcomes.iter().filter_map(|(_, o)| match o {
            AtlasOutcome::Done(stats) => Some(stats),
            _ => None,
        })
    }

    pub fn succeeded(&self) -> usize {
        self.done().count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_failure()).count()
    }

    pub fn cancelled(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, AtlasOutcome::Cancelled))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, AtlasOutcome::Skipped))
            .count()
    }

    pub fn total_frames(&self) -> usize {
        self.done().map(|s| s.frames).sum()
    }

    pub fn total_animations(&self) -> usize {
        self.done().map(|s| s.animations).sum()
    }

    pub fn total_warnings(&self) -> usize {
        self.done().map(|s| s.report.warning_count()).sum()
    }

    /// Failures as `(input, error)` pairs.
    pub fn failures(&self) -> impl Iterator<Item = (&PathBuf, &AtlasError)> {
        self.outcomes.iter().filter_map(|(p, o)| match o {
            AtlasOutcome::Failed(e) => Some((p, e)),
            _ => None,
        })
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::GEOMETRY_CLAMPED;

    fn stats(frames: usize, animations: usize, warnings: usize) -> AtlasStats {
        let mut report = Report::new();
        for _ in 0..warnings {
            report.warning(GEOMETRY_CLAMPED, "clamped");
        }
        AtlasStats {
            frames,
            animations,
            report,
        }
    }

    #[test]
    fn test_totals() {
        let summary = BatchSummary {
            outcomes: vec![
                ("a.png".into(), AtlasOutcome::Done(stats(4, 2, 1))),
                ("b.png".into(), AtlasOutcome::Done(stats(3, 1, 0))),
                ("c.png".into(), AtlasOutcome::Cancelled),
                ("d.png".into(), AtlasOutcome::Skipped),
            ],
        };
        assert_eq!(summary.succeeded(), 2);
        assert_eq!(summary.total_frames(), 7);
        assert_eq!(summary.total_animations(), 3);
        assert_eq!(summary.total_warnings(), 1);
        assert_eq!(summary.cancelled(), 1);
        assert_eq!(summary.skipped(), 1);
        assert!(summary.is_success());
    }

    #[test]
    fn test_cancelled_error_is_not_failure() {
        let outcome = AtlasOutcome::from_result(Err(AtlasError::Cancelled {
            path: "a.png".into(),
        }));
        assert!(matches!(outcome, AtlasOutcome::Cancelled));
        assert!(!outcome.is_failure());
    }

    #[test]
    fn test_failures_listed() {
        let summary = BatchSummary {
            outcomes: vec![(
                "bad.xml".into(),
                AtlasOutcome::Failed(AtlasError::empty("bad.xml")),
            )],
        };
        assert_eq!(summary.failed(), 1);
        assert!(!summary.is_success());
        let (path, _) = summary.failures().next().unwrap();
        assert_eq!(path, &PathBuf::from("bad.xml"));
    }
}
