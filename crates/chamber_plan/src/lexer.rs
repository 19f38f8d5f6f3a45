//! Statement tokenizer.
//!
//! Splits one logical statement into tokens:
//! - words: runs of `[A-Za-z0-9_.]`, optionally led by a sign when a digit
//!   or dot follows (`-3`, `+.5`)
//! - quoted strings (`"..."`, `'...'`), quotes and escapes kept verbatim
//! - any other non-space character as a one-character token
//!
//! `#` outside a quoted string starts a comment running to the end.
//!
//! Interactive prompt lines use the simpler shell-style [`split_words`].

use crate::error::ParseError;

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

/// Tokenize one statement
///
/// # Errors
///
/// Returns error on an unterminated quote or an escape at the very end
pub fn tokenize(input: &str, line: usize) -> Result<Vec<String>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '#' {
            break;
        }

        if c == '"' || c == '\'' {
            tokens.push(quoted(&mut chars, line)?);
            continue;
        }

        let mut token = String::new();
        token.push(c);
        chars.next();

        let signed_number = (c == '+' || c == '-')
            && chars.peek().is_some_and(|n| n.is_ascii_digit() || *n == '.');
        if is_word_char(c) || signed_number {
            while let Some(&n) = chars.peek() {
                if !is_word_char(n) {
                    break;
                }
                token.push(n);
                chars.next();
            }
        }
        tokens.push(token);
    }

    Ok(tokens)
}

fn quoted(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, line: usize) -> Result<String, ParseError> {
    let mut token = String::new();
    let Some(quote) = chars.next() else {
        return Err(ParseError::UnterminatedQuote { line });
    };
    token.push(quote);

    loop {
        match chars.next() {
            None => return Err(ParseError::UnterminatedQuote { line }),
            Some('\\') => {
                let escaped = chars.next().ok_or(ParseError::DanglingEscape { line })?;
                token.push('\\');
                token.push(escaped);
            }
            Some(c) if c == quote => {
                token.push(c);
                return Ok(token);
            }
            Some(c) => token.push(c),
        }
    }
}

/// Split a prompt line into shell-style words
///
/// Words are separated by whitespace. Quotes group characters and are
/// removed; adjacent quoted and bare parts join into one word. A backslash
/// escapes the next character outside quotes, and the active quote or a
/// backslash inside them.
///
/// # Errors
///
/// Returns error on an unterminated quote or a trailing backslash
pub fn split_words(input: &str, line: usize) -> Result<Vec<String>, ParseError> {
    let mut words = Vec::new();
    let mut word: Option<String> = None;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => words.extend(word.take()),
            '#' if word.is_none() => break,
            '\\' => {
                let escaped = chars.next().ok_or(ParseError::DanglingEscape { line })?;
                word.get_or_insert_with(String::new).push(escaped);
            }
            '"' | '\'' => {
                let current = word.get_or_insert_with(String::new);
                loop {
                    match chars.next() {
                        None => return Err(ParseError::UnterminatedQuote { line }),
                        Some(q) if q == c => break,
                        Some('\\') => match chars.next() {
                            Some(e) if e == c || e == '\\' => current.push(e),
                            Some(e) => {
                                current.push('\\');
                                current.push(e);
                            }
                            None => return Err(ParseError::UnterminatedQuote { line }),
                        },
                        Some(other) => current.push(other),
                    }
                }
            }
            other => word.get_or_insert_with(String::new).push(other),
        }
    }
    words.extend(word);
    Ok(words)
}
