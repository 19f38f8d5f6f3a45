//! Option value literals and identifier checks.

use chamber_core::OptionValue;
use once_cell::sync::Lazy;
use regex::Regex;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_]\w*$").expect("valid identifier regex"));

static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+\-]?(\d*\.?\d+|\d+\.?\d*)$").expect("valid number regex"));

/// Whether `token` can name a variable, option or alias
#[must_use]
pub fn is_identifier(token: &str) -> bool {
    IDENTIFIER.is_match(token)
}

/// Decode an option value token, or `None` if it is not a literal
#[must_use]
pub fn option_value(token: &str) -> Option<OptionValue> {
    match token {
        "True" => return Some(OptionValue::Bool(true)),
        "False" => return Some(OptionValue::Bool(false)),
        _ => {}
    }

    if let Some(body) = quoted_body(token) {
        return Some(OptionValue::Str(unescape(body)));
    }

    if NUMBER.is_match(token) {
        return token.parse::<f64>().ok().map(OptionValue::Number);
    }

    None
}

fn quoted_body(token: &str) -> Option<&str> {
    let first = token.chars().next()?;
    if token.len() >= 2 && (first == '"' || first == '\'') && token.ends_with(first) {
        Some(&token[1..token.len() - 1])
    } else {
        None
    }
}

/// Resolve backslash escapes: `\n` is a newline, `\x` is `x`
#[must_use]
pub fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifiers() {
        assert!(is_identifier("abc"));
        assert!(is_identifier("_x9"));
        assert!(!is_identifier("9x"));
        assert!(!is_identifier("<"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("a.b"));
    }

    #[test]
    fn test_bool_literals() {
        assert_eq!(option_value("True"), Some(OptionValue::Bool(true)));
        assert_eq!(option_value("False"), Some(OptionValue::Bool(false)));
        assert_eq!(option_value("true"), None);
    }

    #[test]
    fn test_string_literals() {
        assert_eq!(option_value("\"abc\""), Some(OptionValue::Str("abc".to_string())));
        assert_eq!(option_value("'a\\nb'"), Some(OptionValue::Str("a\nb".to_string())));
        assert_eq!(option_value(r#""say \"hi\"""#), Some(OptionValue::Str("say \"hi\"".to_string())));
        assert_eq!(option_value("''"), Some(OptionValue::Str(String::new())));
        assert_eq!(option_value("\"abc'"), None);
    }

    #[test]
    fn test_number_literals() {
        assert_eq!(option_value("5"), Some(OptionValue::Number(5.0)));
        assert_eq!(option_value("-2.5"), Some(OptionValue::Number(-2.5)));
        assert_eq!(option_value(".5"), Some(OptionValue::Number(0.5)));
        assert_eq!(option_value("3."), Some(OptionValue::Number(3.0)));
        assert_eq!(option_value("1.2.3"), None);
        assert_eq!(option_value("abc"), None);
    }
}
