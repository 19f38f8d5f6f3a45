//! Static properties of a stage type.

use crate::command::CommandInstance;
use crate::error::{CommandError, CommandResult};

/// Required number of input or output slots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many slots
    Fixed(usize),
    /// Decided by the constructed instance's validator
    Validated,
}

/// Slot direction, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Input,
    Output,
}

impl Direction {
    const fn label(self) -> &'static str {
        match self {
            Self::Input => "Input",
            Self::Output => "Output",
        }
    }
}

impl Arity {
    fn check(self, given: usize, direction: Direction, instance: &CommandInstance) -> CommandResult<()> {
        match self {
            Self::Fixed(required) if required == given => Ok(()),
            Self::Fixed(required) => Err(CommandError::Arity(format!(
                "{} size mismatch (required {}, given {})",
                direction.label(),
                required,
                given
            ))),
            Self::Validated => match direction {
                Direction::Input => instance.validate_inputs(given),
                Direction::Output => instance.validate_outputs(given),
            },
        }
    }
}

/// How a stage may be parallelised
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Concurrency {
    /// One worker, strictly ascending order ids
    Sequential,
    /// Many workers, one private instance each
    Parallel,
    /// Many workers sharing one instance
    SharedParallel,
}

impl Concurrency {
    /// Whether more than one worker may run
    #[must_use]
    pub const fn multi_threadable(self) -> bool {
        !matches!(self, Self::Sequential)
    }

    /// Whether workers share one instance
    #[must_use]
    pub const fn share_resources(self) -> bool {
        matches!(self, Self::SharedParallel)
    }

    /// Number of worker tasks for a configured thread count
    #[must_use]
    pub const fn workers(self, threads: usize) -> usize {
        if self.multi_threadable() { threads } else { 1 }
    }

    /// Number of stage instances for a configured thread count
    #[must_use]
    pub const fn instances(self, threads: usize) -> usize {
        match self {
            Self::Parallel => threads,
            Self::Sequential | Self::SharedParallel => 1,
        }
    }
}

/// Descriptor of a stage type, resolved once per statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDescriptor {
    /// Command name used in scripts
    pub name: String,
    /// Input slot requirement
    pub inputs: Arity,
    /// Output slot requirement
    pub outputs: Arity,
    /// Parallelism mode
    pub concurrency: Concurrency,
}

impl CommandDescriptor {
    /// Create a descriptor for a sequential stage
    #[must_use]
    pub fn new(name: impl Into<String>, inputs: Arity, outputs: Arity) -> Self {
        Self {
            name: name.into(),
            inputs,
            outputs,
            concurrency: Concurrency::Sequential,
        }
    }

    /// Set the parallelism mode
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: Concurrency) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Check a statement's slot counts against this descriptor
    ///
    /// `instance` is the first constructed instance; validators run on it.
    ///
    /// # Errors
    ///
    /// Returns error if either count is rejected
    pub fn check_arity(&self, inputs: usize, outputs: usize, instance: &CommandInstance) -> CommandResult<()> {
        self.inputs.check(inputs, Direction::Input, instance)?;
        self.outputs.check(outputs, Direction::Output, instance)
    }
}
