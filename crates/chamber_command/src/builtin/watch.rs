//! `Watch` - live inspector sink.
//!
//! Keeps the most recent input tuple and prints it when the prompt issues
//! `watch` (all inspectors) or `watch name...` (matching inspectors only).

use chamber_core::{Options, Tuple};
use std::fmt::Write as _;
use std::io::Write as _;

use crate::command::{require_at_least, Command, Emit};
use crate::descriptor::{Arity, CommandDescriptor};
use crate::error::CommandResult;
use crate::registry::CommandEntry;

/// Inspector stage
#[derive(Debug, Default)]
pub struct Watch {
    name: Option<String>,
    data: Tuple,
}

impl Watch {
    /// Build from statement options
    ///
    /// # Errors
    ///
    /// Returns error on unknown or malformed options
    pub fn new(options: &Options) -> CommandResult<Self> {
        options.only(&["name"])?;
        Ok(Self {
            name: options.str("name")?.map(str::to_string),
            data: Tuple::new(),
        })
    }

    /// Registry entry
    #[must_use]
    pub fn entry() -> CommandEntry {
        CommandEntry::exclusive(
            CommandDescriptor::new("Watch", Arity::Validated, Arity::Fixed(0)),
            |args| Self::new(args.options),
        )
    }

    /// Whether a `watch ...` event addresses this inspector
    fn is_addressed(&self, tokens: &[String]) -> bool {
        match tokens.split_first() {
            Some((head, rest)) if head == "watch" => {
                rest.is_empty() || self.name.as_ref().is_some_and(|n| rest.contains(n))
            }
            _ => false,
        }
    }

    /// Report of the stored tuple
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let name = self.name.as_deref().unwrap_or("None");
        let _ = writeln!(out, "Watch name: {}", name);
        if self.data.is_empty() {
            let _ = writeln!(out, " (Empty)");
        }
        for (i, value) in self.data.iter().enumerate() {
            let _ = writeln!(out, " {}: Type={}, Value={}", i, value.type_name(), value);
        }
        out
    }
}

impl Command for Watch {
    fn execute(&mut self, input: Tuple) -> CommandResult<Emit> {
        self.data = input;
        Ok(Emit::empty())
    }

    fn validate_inputs(&self, count: usize) -> CommandResult<()> {
        require_at_least(count, 1, "input")
    }

    fn on_control_event(&mut self, tokens: &[String]) {
        if !self.is_addressed(tokens) {
            return;
        }
        let report = self.render();
        let mut stdout = std::io::stdout().lock();
        if let Err(e) = stdout.write_all(report.as_bytes()).and_then(|()| stdout.flush()) {
            tracing::debug!("watch report not written: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chamber_core::{OptionValue, Value};

    fn tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_watch_stores_latest() {
        let mut watch = Watch::new(&Options::new()).unwrap();
        assert!(watch.render().contains("(Empty)"));

        watch.execute(vec![Value::Int(1)]).unwrap();
        watch.execute(vec![Value::Int(2), Value::from("x")]).unwrap();
        let report = watch.render();
        assert!(report.contains(" 0: Type=int, Value=2"));
        assert!(report.contains(" 1: Type=str, Value=x"));
        assert!(!report.contains("Value=1\n"));
    }

    #[test]
    fn test_watch_addressing() {
        let opts = Options::new().with("name", OptionValue::Str("lines".to_string()));
        let watch = Watch::new(&opts).unwrap();
        assert!(watch.is_addressed(&tokens(&["watch"])));
        assert!(watch.is_addressed(&tokens(&["watch", "other", "lines"])));
        assert!(!watch.is_addressed(&tokens(&["watch", "other"])));
        assert!(!watch.is_addressed(&tokens(&["status"])));
        assert!(!watch.is_addressed(&[]));

        let anonymous = Watch::new(&Options::new()).unwrap();
        assert!(!anonymous.is_addressed(&tokens(&["watch", "lines"])));
    }

    #[test]
    fn test_watch_requires_input() {
        let watch = Watch::default();
        assert!(watch.validate_inputs(0).is_err());
        assert!(watch.validate_inputs(2).is_ok());
    }
}
