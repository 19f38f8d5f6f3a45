//! Errors raised by stage construction and stage logic.

use chamber_core::CoreError;

/// Result of a command operation
pub type CommandResult<T> = Result<T, CommandError>;

/// Command error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// Stage logic failed while processing a tuple
    #[error("{message}")]
    Failed {
        /// What went wrong
        message: String,
        /// Diagnostic trace, if the stage captured one
        trace: Option<String>,
    },

    /// The statement's input or output count was rejected
    #[error("{0}")]
    Arity(String),

    /// No command with this name is registered
    #[error("Command \"{name}\" is not found")]
    UnknownCommand {
        /// Requested name
        name: String,
    },

    /// The stage could not be constructed
    #[error("{0}")]
    Construction(String),

    /// A statement option was missing or malformed
    #[error(transparent)]
    Option(#[from] CoreError),

    /// I/O failure inside a stage
    #[error("I/O error: {0}")]
    Io(String),
}

impl CommandError {
    /// Stage failure with a message only
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            trace: None,
        }
    }

    /// Stage failure carrying a diagnostic trace
    #[must_use]
    pub fn failed_with_trace(message: impl Into<String>, trace: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            trace: Some(trace.into()),
        }
    }

    /// Diagnostic trace, if any
    #[must_use]
    pub fn trace(&self) -> Option<&str> {
        match self {
            Self::Failed { trace, .. } => trace.as_deref(),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CommandError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
