//! `Seq` - integer counter.
//!
//! Emits `0, 1, 2, ...`. With `: stop=N` it is a source emitting `0..N`;
//! without it, an optional single input paces the counter.

use chamber_core::{Options, Tuple, Value};

use crate::command::{Command, Emit};
use crate::descriptor::{Arity, CommandDescriptor};
use crate::error::{CommandError, CommandResult};
use crate::registry::CommandEntry;

/// Counter stage
#[derive(Debug)]
pub struct Seq {
    counter: i64,
    stop: Option<i64>,
}

impl Seq {
    /// Build from statement options
    ///
    /// # Errors
    ///
    /// Returns error on unknown or malformed options
    pub fn new(options: &Options) -> CommandResult<Self> {
        options.only(&["stop"])?;
        let stop = options.int("stop")?.filter(|s| *s >= 0);
        Ok(Self { counter: 0, stop })
    }

    /// Registry entry
    #[must_use]
    pub fn entry() -> CommandEntry {
        CommandEntry::exclusive(
            CommandDescriptor::new("Seq", Arity::Validated, Arity::Fixed(1)),
            |args| Self::new(args.options),
        )
    }
}

impl Command for Seq {
    fn execute(&mut self, _input: Tuple) -> CommandResult<Emit> {
        if Some(self.counter) == self.stop {
            return Ok(Emit::EndOfStream);
        }
        let current = self.counter;
        self.counter += 1;
        Ok(Emit::one(Value::Int(current)))
    }

    fn validate_inputs(&self, count: usize) -> CommandResult<()> {
        match self.stop {
            None if count > 1 => Err(CommandError::Arity("Too many inputs are given".to_string())),
            Some(_) if count != 0 => Err(CommandError::Arity(
                "You can not specify any input if `stop' is set".to_string(),
            )),
            _ => Ok(()),
        }
    }
}
