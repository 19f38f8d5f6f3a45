//! Script parse errors.

/// Parse error; every variant carries the 1-based script line
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// A quoted string was not closed before the end of the statement
    #[error("No closing quotation")]
    UnterminatedQuote {
        /// Script line
        line: usize,
    },

    /// A backslash ended the statement inside a quoted string
    #[error("No escaped character")]
    DanglingEscape {
        /// Script line
        line: usize,
    },

    /// The statement does not follow the grammar
    #[error("Syntax error: {reason}")]
    Syntax {
        /// Script line
        line: usize,
        /// What was expected
        reason: String,
    },

    /// The script ended in the middle of a continued line
    #[error("Unexpected end of script after line continuation")]
    UnfinishedContinuation {
        /// Script line
        line: usize,
    },
}

impl ParseError {
    /// Syntax error helper
    #[must_use]
    pub fn syntax(line: usize, reason: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            reason: reason.into(),
        }
    }

    /// Script line the error refers to
    #[must_use]
    pub const fn line(&self) -> usize {
        match self {
            Self::UnterminatedQuote { line }
            | Self::DanglingEscape { line }
            | Self::Syntax { line, .. }
            | Self::UnfinishedContinuation { line } => *line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_accessor() {
        assert_eq!(ParseError::UnterminatedQuote { line: 4 }.line(), 4);
        assert_eq!(ParseError::syntax(9, "expected identifier").line(), 9);
    }

    #[test]
    fn test_display() {
        let err = ParseError::syntax(1, "expected identifier after `<'");
        assert_eq!(err.to_string(), "Syntax error: expected identifier after `<'");
    }
}
