//! Statement grammar.
//!
//! ```text
//! CommandName [< in...] [> out...] [: opt[=value]]* [* threads]
//! ```

use chamber_core::{OptionValue, Options};
use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::literal::{is_identifier, option_value};

/// One compiled-to-be stage declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    /// Script line (last physical line of a continued statement)
    pub line: usize,
    /// Command name
    pub command: String,
    /// Input variable names, in slot order
    pub inputs: Vec<String>,
    /// Output variable names, in slot order
    pub outputs: Vec<String>,
    /// Named options
    pub options: Options,
    /// Explicit `* N` worker count
    pub threads: Option<usize>,
}

impl Statement {
    /// Create a bare statement
    #[must_use]
    pub fn new(line: usize, command: impl Into<String>) -> Self {
        Self {
            line,
            command: command.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            options: Options::new(),
            threads: None,
        }
    }

    /// Builder: input variables
    #[must_use]
    pub fn with_inputs(mut self, names: &[&str]) -> Self {
        self.inputs = names.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Builder: output variables
    #[must_use]
    pub fn with_outputs(mut self, names: &[&str]) -> Self {
        self.outputs = names.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Builder: one option
    #[must_use]
    pub fn with_option(mut self, name: &str, value: OptionValue) -> Self {
        self.options.insert(name, value);
        self
    }

    /// Builder: worker count
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }
}

struct Cursor<'a> {
    tokens: &'a [String],
    pos: usize,
    line: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).map(String::as_str)
    }

    fn next(&mut self) -> Option<&'a str> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn identifier(&mut self, after: &str) -> Result<&'a str, ParseError> {
        match self.peek() {
            Some(t) if is_identifier(t) => {
                self.pos += 1;
                Ok(t)
            }
            _ => Err(ParseError::syntax(self.line, format!("expected identifier after `{}'", after))),
        }
    }

    fn identifiers(&mut self, after: &str) -> Result<Vec<String>, ParseError> {
        let mut names = vec![self.identifier(after)?.to_string()];
        while let Some(t) = self.peek().filter(|t| is_identifier(t)) {
            names.push(t.to_string());
            self.pos += 1;
        }
        Ok(names)
    }
}

/// Parse an already alias-expanded token list
///
/// # Errors
///
/// Returns error if the tokens do not follow the grammar
pub fn parse_statement(tokens: &[String], line: usize) -> Result<Statement, ParseError> {
    let (command, rest) = tokens
        .split_first()
        .ok_or_else(|| ParseError::syntax(line, "empty statement"))?;
    if !is_identifier(command) {
        return Err(ParseError::syntax(line, format!("invalid command name `{}'", command)));
    }

    let mut statement = Statement::new(line, command.clone());
    let mut cursor = Cursor { tokens: rest, pos: 0, line };

    while let Some(token) = cursor.next() {
        match token {
            "<" => statement.inputs.extend(cursor.identifiers("<")?),
            ">" => statement.outputs.extend(cursor.identifiers(">")?),
            ":" => {
                let name = cursor.identifier(":")?;
                let value = if cursor.peek() == Some("=") {
                    cursor.next();
                    let raw = cursor
                        .next()
                        .ok_or_else(|| ParseError::syntax(line, format!("missing value for option `{}'", name)))?;
                    option_value(raw)
                        .ok_or_else(|| ParseError::syntax(line, format!("invalid value `{}' for option `{}'", raw, name)))?
                } else {
                    OptionValue::Bool(true)
                };
                statement.options.insert(name, value);
            }
            "*" => {
                if statement.threads.is_some() {
                    return Err(ParseError::syntax(line, "thread count given twice"));
                }
                let count = cursor
                    .next()
                    .filter(|t| !t.is_empty() && t.chars().all(|c| c.is_ascii_digit()))
                    .and_then(|t| t.parse::<usize>().ok())
                    .ok_or_else(|| ParseError::syntax(line, "expected thread count after `*'"))?;
                if count == 0 {
                    return Err(ParseError::syntax(line, "thread count must be positive"));
                }
                statement.threads = Some(count);
            }
            other => return Err(ParseError::syntax(line, format!("unexpected token `{}'", other))),
        }
    }

    Ok(statement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse(src: &str) -> Result<Statement, ParseError> {
        parse_statement(&tokenize(src, 7)?, 7)
    }

    #[test]
    fn test_parse_full_statement() {
        let stmt = parse("Join < a b > pair : mode=\"zip\" : strict * 4").unwrap();
        assert_eq!(stmt.command, "Join");
        assert_eq!(stmt.inputs, vec!["a", "b"]);
        assert_eq!(stmt.outputs, vec!["pair"]);
        assert_eq!(stmt.options.get("mode"), Some(&OptionValue::Str("zip".to_string())));
        assert_eq!(stmt.options.get("strict"), Some(&OptionValue::Bool(true)));
        assert_eq!(stmt.threads, Some(4));
        assert_eq!(stmt.line, 7);
    }

    #[test]
    fn test_parse_source() {
        let stmt = parse("Seq > x : stop=5").unwrap();
        assert!(stmt.inputs.is_empty());
        assert_eq!(stmt.options.int("stop"), Ok(Some(5)));
        assert_eq!(stmt.threads, None);
    }

    #[test]
    fn test_repeated_arrows_accumulate() {
        let stmt = parse("Cmd < a > x < b").unwrap();
        assert_eq!(stmt.inputs, vec!["a", "b"]);
        assert_eq!(stmt.outputs, vec!["x"]);
    }

    #[test]
    fn test_syntax_errors() {
        assert!(matches!(parse("Cmd <"), Err(ParseError::Syntax { line: 7, .. })));
        assert!(matches!(parse("Cmd > 9"), Err(ParseError::Syntax { .. })));
        assert!(matches!(parse("Cmd : x="), Err(ParseError::Syntax { .. })));
        assert!(matches!(parse("Cmd : x=bare"), Err(ParseError::Syntax { .. })));
        assert!(matches!(parse("Cmd * 2 * 3"), Err(ParseError::Syntax { .. })));
        assert!(matches!(parse("Cmd * x"), Err(ParseError::Syntax { .. })));
        assert!(matches!(parse("Cmd * 0"), Err(ParseError::Syntax { .. })));
        assert!(matches!(parse("Cmd extra"), Err(ParseError::Syntax { .. })));
        assert!(matches!(parse("< a"), Err(ParseError::Syntax { .. })));
    }

    #[test]
    fn test_empty_statement() {
        assert!(matches!(parse_statement(&[], 2), Err(ParseError::Syntax { line: 2, .. })));
    }

    #[test]
    fn test_statement_json() {
        let stmt = parse("Seq > x : stop=3").unwrap();
        let json = serde_json::to_value(&stmt).unwrap();
        assert_eq!(json["command"], "Seq");
        assert_eq!(json["options"]["stop"], 3.0);
        assert_eq!(json["outputs"][0], "x");
    }
}
