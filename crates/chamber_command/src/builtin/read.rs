//! `Read` - line reader source.

use chamber_core::{Options, Tuple, Value};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::command::{Canceller, Command, Emit};
use crate::descriptor::{Arity, CommandDescriptor};
use crate::error::{CommandError, CommandResult};
use crate::registry::CommandEntry;

/// Emits each line of `: file="..."`, newline included
pub struct Read {
    reader: Option<BufReader<File>>,
    cancelled: Arc<AtomicBool>,
}

impl Read {
    /// Open the file named by the `file` option
    ///
    /// # Errors
    ///
    /// Returns error if the option is missing or the file cannot be opened
    pub fn new(options: &Options) -> CommandResult<Self> {
        options.only(&["file"])?;
        let path = options.require_str("file")?;
        let file = File::open(path)
            .map_err(|e| CommandError::Construction(format!("could not open `{}': {}", path, e)))?;
        Ok(Self {
            reader: Some(BufReader::new(file)),
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Registry entry
    #[must_use]
    pub fn entry() -> CommandEntry {
        CommandEntry::exclusive(
            CommandDescriptor::new("Read", Arity::Fixed(0), Arity::Fixed(1)),
            |args| Self::new(args.options),
        )
    }
}

impl Command for Read {
    fn execute(&mut self, _input: Tuple) -> CommandResult<Emit> {
        if self.cancelled.load(Ordering::Acquire) {
            self.reader = None;
        }
        let Some(reader) = self.reader.as_mut() else {
            return Ok(Emit::EndOfStream);
        };

        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            self.reader = None;
            return Ok(Emit::EndOfStream);
        }
        Ok(Emit::one(Value::Str(line)))
    }

    fn canceller(&self) -> Option<Canceller> {
        let cancelled = Arc::clone(&self.cancelled);
        Some(Arc::new(move || cancelled.store(true, Ordering::Release)))
    }
}
