//! Core error types for CHAMBER.

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;

/// Core error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// A required option was not given
    #[error("Option `{name}' is required")]
    MissingOption {
        /// Option name
        name: String,
    },

    /// An option holds a value of the wrong kind
    #[error("Option `{name}' must be {expected}, got {actual}")]
    OptionType {
        /// Option name
        name: String,
        /// Expected kind
        expected: &'static str,
        /// Kind actually given
        actual: &'static str,
    },

    /// An option holds a value outside the accepted range
    #[error("Invalid value for option `{name}': {reason}")]
    InvalidOption {
        /// Option name
        name: String,
        /// Why the value was rejected
        reason: String,
    },

    /// A value could not be interpreted as the requested type
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Expected type name
        expected: &'static str,
        /// Actual type name
        actual: &'static str,
    },

    /// Invalid encoding
    #[error("Invalid encoding: {message}")]
    InvalidEncoding {
        /// Encoder message
        message: String,
    },
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidEncoding {
            message: err.to_string(),
        }
    }
}
