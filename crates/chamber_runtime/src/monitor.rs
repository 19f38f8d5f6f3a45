//! End-of-run reporting.

use crate::error::StageFailure;
use crate::processor::Processor;

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every stage reached the end of its stream
    Completed,
    /// An operator kill stopped the run
    Killed,
    /// A stage failed; the run was killed
    Failed(StageFailure),
}

impl RunOutcome {
    /// Check for a clean finish
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// The failure that ended the run
    #[must_use]
    pub const fn failure(&self) -> Option<&StageFailure> {
        match self {
            Self::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Per-stage counters after a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSummary {
    /// Script line
    pub line: usize,
    /// Command name
    pub command: String,
    /// Worker tasks that ran
    pub workers: usize,
    /// Tuples produced
    pub completed: u64,
}

impl StageSummary {
    /// Snapshot a processor
    #[must_use]
    pub fn of(processor: &Processor) -> Self {
        Self {
            line: processor.line(),
            command: processor.command().to_string(),
            workers: processor.workers(),
            completed: processor.completed(),
        }
    }
}

impl std::fmt::Display for StageSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "line {}: {} x{} completed {}",
            self.line, self.command, self.workers, self.completed
        )
    }
}

/// Result of [`crate::RunHandle::wait`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// How the run ended
    pub outcome: RunOutcome,
    /// One entry per stage, in statement order
    pub stages: Vec<StageSummary>,
}

impl RunReport {
    /// Summary of the stage declared at `line`
    #[must_use]
    pub fn stage(&self, line: usize) -> Option<&StageSummary> {
        self.stages.iter().find(|s| s.line == line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_helpers() {
        assert!(RunOutcome::Completed.is_completed());
        assert!(RunOutcome::Killed.failure().is_none());

        let failure = StageFailure {
            line: 4,
            command: "Map".to_string(),
            message: "bad".to_string(),
            trace: None,
        };
        let outcome = RunOutcome::Failed(failure.clone());
        assert!(!outcome.is_completed());
        assert_eq!(outcome.failure(), Some(&failure));
    }

    #[test]
    fn test_summary_display_and_lookup() {
        let summary = StageSummary {
            line: 2,
            command: "Seq".to_string(),
            workers: 1,
            completed: 5,
        };
        assert_eq!(summary.to_string(), "line 2: Seq x1 completed 5");

        let report = RunReport {
            outcome: RunOutcome::Completed,
            stages: vec![summary.clone()],
        };
        assert_eq!(report.stage(2), Some(&summary));
        assert_eq!(report.stage(3), None);
    }
}
