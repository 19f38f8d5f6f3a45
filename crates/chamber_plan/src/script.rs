//! Script front end: physical lines to statements.
//!
//! Handles comments, `\` continuation, and `Alias` definitions, then hands
//! each logical statement to the statement grammar.

use indexmap::IndexMap;

use crate::error::ParseError;
use crate::lexer::tokenize;
use crate::literal::is_identifier;
use crate::statement::{parse_statement, Statement};

const ALIAS_KEYWORD: &str = "Alias";

/// Incremental script parser
///
/// Feed physical lines with [`ScriptParser::push_line`]; completed
/// statements are returned as soon as their last line arrives.
#[derive(Debug, Default)]
pub struct ScriptParser {
    aliases: IndexMap<String, Vec<String>>,
    pending: String,
    line: usize,
}

impl ScriptParser {
    /// Create a parser with no aliases
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of physical lines consumed
    #[must_use]
    pub const fn lines_read(&self) -> usize {
        self.line
    }

    /// Defined aliases, in definition order
    #[must_use]
    pub fn aliases(&self) -> &IndexMap<String, Vec<String>> {
        &self.aliases
    }

    /// Consume one physical line
    ///
    /// # Errors
    ///
    /// Returns error if the completed statement is malformed
    pub fn push_line(&mut self, raw: &str) -> Result<Option<Statement>, ParseError> {
        self.line += 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(None);
        }

        let mut text = std::mem::take(&mut self.pending);
        text.push_str(trimmed);
        if let Some(head) = text.strip_suffix('\\') {
            self.pending = format!("{} ", head);
            return Ok(None);
        }

        self.statement(&text)
    }

    /// Signal end of input
    ///
    /// # Errors
    ///
    /// Returns error if a continued line was never finished
    pub fn finish(&self) -> Result<(), ParseError> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            Err(ParseError::UnfinishedContinuation { line: self.line })
        }
    }

    fn statement(&mut self, text: &str) -> Result<Option<Statement>, ParseError> {
        let line = self.line;
        let tokens = tokenize(text, line)?;

        if tokens.first().map(String::as_str) == Some(ALIAS_KEYWORD) {
            self.define_alias(&tokens[1..], line)?;
            return Ok(None);
        }

        let expanded = self.expand(&tokens);
        parse_statement(&expanded, line).map(Some)
    }

    fn define_alias(&mut self, rest: &[String], line: usize) -> Result<(), ParseError> {
        let Some((name, replacement)) = rest.split_first() else {
            return Err(ParseError::syntax(line, "Alias needs a name and a replacement"));
        };
        if !is_identifier(name) {
            return Err(ParseError::syntax(line, format!("invalid alias name `{}'", name)));
        }
        if replacement.is_empty() {
            return Err(ParseError::syntax(line, "Alias needs a name and a replacement"));
        }
        let replacement = self.expand(replacement);
        self.aliases.insert(name.clone(), replacement);
        Ok(())
    }

    fn expand(&self, tokens: &[String]) -> Vec<String> {
        let mut out = Vec::with_capacity(tokens.len());
        for token in tokens {
            match self.aliases.get(token) {
                Some(replacement) => out.extend(replacement.iter().cloned()),
                None => out.push(token.clone()),
            }
        }
        out
    }
}

/// Parse a complete script
///
/// # Errors
///
/// Returns the first parse error
pub fn parse_script(source: &str) -> Result<Vec<Statement>, ParseError> {
    let mut parser = ScriptParser::new();
    let mut statements = Vec::new();
    for line in source.lines() {
        if let Some(statement) = parser.push_line(line)? {
            statements.push(statement);
        }
    }
    parser.finish()?;
    Ok(statements)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script_lines() {
        let src = "# counter pipeline\n\nSeq > x : stop=5\nWatch < x\n";
        let stmts = parse_script(src).unwrap();
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0].line, 3);
        assert_eq!(stmts[1].line, 4);
        assert_eq!(stmts[1].inputs, vec!["x"]);
    }

    #[test]
    fn test_continuation() {
        let src = "Seq \\\n  > x \\\n  : stop=2\nWatch < x";
        let stmts = parse_script(src).unwrap();
        assert_eq!(stmts[0].line, 3);
        assert_eq!(stmts[0].outputs, vec!["x"]);
        assert_eq!(stmts[0].options.int("stop"), Ok(Some(2)));
        assert_eq!(stmts[1].line, 4);
    }

    #[test]
    fn test_unfinished_continuation() {
        let err = parse_script("Seq > x \\").unwrap_err();
        assert_eq!(err, ParseError::UnfinishedContinuation { line: 1 });
    }

    #[test]
    fn test_alias_substitution() {
        let src = "Alias Counter Seq : stop=3\nAlias Pair a b\nCounter > a\nCounter > b\nJoin < Pair > out";
        let stmts = parse_script(src).unwrap();
        assert_eq!(stmts.len(), 3);
        assert_eq!(stmts[0].command, "Seq");
        assert_eq!(stmts[0].options.int("stop"), Ok(Some(3)));
        assert_eq!(stmts[2].inputs, vec!["a", "b"]);
    }

    #[test]
    fn test_alias_of_alias_expands_at_definition() {
        let src = "Alias One a\nAlias Two One b\nCmd < Two";
        let stmts = parse_script(src).unwrap();
        assert_eq!(stmts[0].inputs, vec!["a", "b"]);
    }

    #[test]
    fn test_alias_errors() {
        assert!(matches!(parse_script("Alias x"), Err(ParseError::Syntax { line: 1, .. })));
        assert!(matches!(parse_script("Alias 9x y"), Err(ParseError::Syntax { line: 1, .. })));
        assert!(matches!(parse_script("Alias"), Err(ParseError::Syntax { line: 1, .. })));
    }

    #[test]
    fn test_error_reports_line() {
        let err = parse_script("Seq > x\n\nWatch < \"x").unwrap_err();
        assert_eq!(err, ParseError::UnterminatedQuote { line: 3 });
    }

    #[test]
    fn test_incremental_parser() {
        let mut parser = ScriptParser::new();
        assert_eq!(parser.push_line("Alias S Seq").unwrap(), None);
        let stmt = parser.push_line("S > x").unwrap().unwrap();
        assert_eq!(stmt.command, "Seq");
        assert_eq!(parser.lines_read(), 2);
        assert!(parser.aliases().contains_key("S"));
        assert!(parser.finish().is_ok());
    }
}
