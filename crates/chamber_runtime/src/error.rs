//! Build-time and run-time errors.

use chamber_command::CommandError;
use chamber_plan::ParseError;

/// Why a statement could not be compiled
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildErrorKind {
    /// Malformed script text
    #[error(transparent)]
    Parse(ParseError),

    /// Unknown command, rejected arity, or failed construction
    #[error(transparent)]
    Command(CommandError),

    /// Input variable not bound by an earlier statement
    #[error("Variable \"{name}\" is not defined")]
    UndefinedVariable {
        /// Variable name
        name: String,
    },
}

/// Build error, always tied to a script line
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("At line {line}: {kind}")]
pub struct BuildError {
    /// Offending statement's line
    pub line: usize,
    /// What went wrong
    pub kind: BuildErrorKind,
}

impl BuildError {
    /// Create a build error
    #[must_use]
    pub const fn new(line: usize, kind: BuildErrorKind) -> Self {
        Self { line, kind }
    }

    /// Diagnostic trace carried by a failed stage constructor
    #[must_use]
    pub fn trace(&self) -> Option<&str> {
        match &self.kind {
            BuildErrorKind::Command(err) => err.trace(),
            _ => None,
        }
    }
}

impl From<ParseError> for BuildError {
    fn from(err: ParseError) -> Self {
        Self::new(err.line(), BuildErrorKind::Parse(err))
    }
}

/// Fatal failure of a stage during a run
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("At line {line}: {message}")]
pub struct StageFailure {
    /// Line of the failing statement
    pub line: usize,
    /// Command name of the failing stage
    pub command: String,
    /// Failure message
    pub message: String,
    /// Diagnostic trace
    pub trace: Option<String>,
}

/// Error starting worker threads
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("At line {line}: could not spawn worker: {message}")]
pub struct SpawnError {
    /// Line of the stage whose worker failed to start
    pub line: usize,
    /// OS error text
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_error_display() {
        let err = BuildError::new(
            3,
            BuildErrorKind::UndefinedVariable {
                name: "x".to_string(),
            },
        );
        assert_eq!(err.to_string(), "At line 3: Variable \"x\" is not defined");
        assert_eq!(err.trace(), None);
    }

    #[test]
    fn test_build_error_from_parse() {
        let err: BuildError = ParseError::UnterminatedQuote { line: 12 }.into();
        assert_eq!(err.line, 12);
        assert_eq!(err.to_string(), "At line 12: No closing quotation");
    }

    #[test]
    fn test_build_error_trace() {
        let err = BuildError::new(
            1,
            BuildErrorKind::Command(CommandError::failed_with_trace("bad", "frame 0")),
        );
        assert_eq!(err.trace(), Some("frame 0"));
    }

    #[test]
    fn test_stage_failure_display() {
        let failure = StageFailure {
            line: 2,
            command: "Map".to_string(),
            message: "Runtime error".to_string(),
            trace: None,
        };
        assert_eq!(failure.to_string(), "At line 2: Runtime error");
    }
}
