//! CHAMBER Planner
//!
//! Front end for pipeline scripts: tokenizing, alias expansion and
//! statement parsing. The result is a list of [`Statement`]s with their
//! script line numbers, ready for the runtime's graph builder.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod lexer;
pub mod literal;
pub mod script;
pub mod statement;

pub use error::ParseError;
pub use lexer::{split_words, tokenize};
pub use script::{parse_script, ScriptParser};
pub use statement::{parse_statement, Statement};
