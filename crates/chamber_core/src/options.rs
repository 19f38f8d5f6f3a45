//! Named options attached to a script statement.
//!
//! Options are taken verbatim from `: name=value` clauses. Values are
//! booleans, numbers or strings; a bare `: name` is `True`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};

/// Value of a single statement option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// `True` / `False`
    Bool(bool),
    /// Decimal literal
    Number(f64),
    /// Quoted string with escapes resolved
    Str(String),
}

impl OptionValue {
    /// Kind name used in diagnostics
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::Str(_) => "string",
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(true) => write!(f, "True"),
            Self::Bool(false) => write!(f, "False"),
            Self::Number(n) => write!(f, "{}", n),
            Self::Str(s) => write!(f, "{:?}", s),
        }
    }
}

/// Options of one statement, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Options {
    entries: IndexMap<String, OptionValue>,
}

impl Options {
    /// Create an empty option set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option, replacing any earlier value with the same name
    pub fn insert(&mut self, name: impl Into<String>, value: OptionValue) {
        self.entries.insert(name.into(), value);
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: OptionValue) -> Self {
        self.insert(name, value);
        self
    }

    /// Raw access
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.entries.get(name)
    }

    /// Check whether an option was given
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of options
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Boolean option with a default
    ///
    /// # Errors
    ///
    /// Returns error if the option is present but not a boolean
    pub fn bool_or(&self, name: &str, default: bool) -> CoreResult<bool> {
        match self.entries.get(name) {
            None => Ok(default),
            Some(OptionValue::Bool(b)) => Ok(*b),
            Some(other) => Err(type_error(name, "a boolean", other)),
        }
    }

    /// Integral option, if present
    ///
    /// # Errors
    ///
    /// Returns error if the option is present but not an integral number
    pub fn int(&self, name: &str) -> CoreResult<Option<i64>> {
        match self.entries.get(name) {
            None => Ok(None),
            Some(OptionValue::Number(n)) if n.fract() == 0.0 && n.is_finite() => Ok(Some(*n as i64)),
            Some(OptionValue::Number(n)) => Err(CoreError::InvalidOption {
                name: name.to_string(),
                reason: format!("{} is not an integer", n),
            }),
            Some(other) => Err(type_error(name, "a number", other)),
        }
    }

    /// String option, if present
    ///
    /// # Errors
    ///
    /// Returns error if the option is present but not a string
    pub fn str(&self, name: &str) -> CoreResult<Option<&str>> {
        match self.entries.get(name) {
            None => Ok(None),
            Some(OptionValue::Str(s)) => Ok(Some(s)),
            Some(other) => Err(type_error(name, "a string", other)),
        }
    }

    /// String option that must be present
    ///
    /// # Errors
    ///
    /// Returns error if the option is missing or not a string
    pub fn require_str(&self, name: &str) -> CoreResult<&str> {
        self.str(name)?.ok_or_else(|| CoreError::MissingOption {
            name: name.to_string(),
        })
    }

    /// Reject options a stage does not understand
    ///
    /// # Errors
    ///
    /// Returns error naming the first unknown option
    pub fn only(&self, allowed: &[&str]) -> CoreResult<()> {
        match self.entries.keys().find(|k| !allowed.contains(&k.as_str())) {
            Some(name) => Err(CoreError::InvalidOption {
                name: name.clone(),
                reason: "unexpected option".to_string(),
            }),
            None => Ok(()),
        }
    }
}

fn type_error(name: &str, expected: &'static str, actual: &OptionValue) -> CoreError {
    CoreError::OptionType {
        name: name.to_string(),
        expected,
        actual: actual.kind(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Options {
        Options::new()
            .with("stop", OptionValue::Number(5.0))
            .with("file", OptionValue::Str("in.txt".to_string()))
            .with("verbose", OptionValue::Bool(true))
    }

    #[test]
    fn test_options_getters() {
        let opts = sample();
        assert_eq!(opts.int("stop"), Ok(Some(5)));
        assert_eq!(opts.str("file"), Ok(Some("in.txt")));
        assert_eq!(opts.bool_or("verbose", false), Ok(true));
        assert_eq!(opts.bool_or("quiet", false), Ok(false));
        assert_eq!(opts.int("missing"), Ok(None));
    }

    #[test]
    fn test_options_type_errors() {
        let opts = sample();
        assert!(matches!(opts.int("file"), Err(CoreError::OptionType { .. })));
        assert!(matches!(opts.str("stop"), Err(CoreError::OptionType { .. })));

        let frac = Options::new().with("stop", OptionValue::Number(2.5));
        assert!(matches!(frac.int("stop"), Err(CoreError::InvalidOption { .. })));
    }

    #[test]
    fn test_require_str() {
        let opts = Options::new();
        assert_eq!(
            opts.require_str("file"),
            Err(CoreError::MissingOption {
                name: "file".to_string()
            })
        );
    }

    #[test]
    fn test_only() {
        let opts = sample();
        assert!(opts.only(&["stop", "file", "verbose"]).is_ok());
        let err = opts.only(&["stop"]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidOption { name, .. } if name == "file"));
    }

    #[test]
    fn test_insert_keeps_declaration_order() {
        let mut opts = Options::new();
        opts.insert("b", OptionValue::Bool(true));
        opts.insert("a", OptionValue::Bool(false));
        opts.insert("b", OptionValue::Bool(false));
        let names: Vec<&str> = opts.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(opts.len(), 2);
    }
}
