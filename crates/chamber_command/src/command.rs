//! Stage contract.
//!
//! A stage is either [`Command`], owned by exactly one worker at a time, or
//! [`SharedCommand`], one instance invoked concurrently by every worker of a
//! processor. Shared stages receive the worker index so they can manage
//! per-worker sub-resources themselves.

use chamber_core::Tuple;
use std::sync::Arc;

use crate::error::{CommandError, CommandResult};

/// What a stage produced for one input tuple
#[derive(Debug, Clone, PartialEq)]
pub enum Emit {
    /// Output tuple, one value per declared output slot
    Tuple(Tuple),
    /// The stream ends here; no output for this input
    EndOfStream,
}

impl Emit {
    /// Shorthand for a single-value tuple
    #[must_use]
    pub fn one(value: impl Into<chamber_core::Value>) -> Self {
        Self::Tuple(vec![value.into()])
    }

    /// Empty tuple, used by sinks
    #[must_use]
    pub fn empty() -> Self {
        Self::Tuple(Vec::new())
    }
}

/// Best-effort cancellation hook, callable while the stage is mid-execution
pub type Canceller = Arc<dyn Fn() + Send + Sync>;

/// A stage instance owned by a single worker
pub trait Command: Send {
    /// Process one input tuple; sources receive an empty tuple
    ///
    /// # Errors
    ///
    /// Returns error if the stage fails; the run is killed
    fn execute(&mut self, input: Tuple) -> CommandResult<Emit>;

    /// Validate the statement's input count when the descriptor defers to
    /// the instance
    ///
    /// # Errors
    ///
    /// Returns error if the count is unacceptable
    fn validate_inputs(&self, _count: usize) -> CommandResult<()> {
        Ok(())
    }

    /// Validate the statement's output count when the descriptor defers to
    /// the instance
    ///
    /// # Errors
    ///
    /// Returns error if the count is unacceptable
    fn validate_outputs(&self, _count: usize) -> CommandResult<()> {
        Ok(())
    }

    /// Hook invoked once during a global kill
    fn canceller(&self) -> Option<Canceller> {
        None
    }

    /// Interactive control event, already tokenized
    fn on_control_event(&mut self, _tokens: &[String]) {}
}

/// A stage instance shared by all workers of a processor
pub trait SharedCommand: Send + Sync {
    /// Process one input tuple on behalf of `worker`
    ///
    /// # Errors
    ///
    /// Returns error if the stage fails; the run is killed
    fn execute(&self, worker: usize, input: Tuple) -> CommandResult<Emit>;

    /// See [`Command::validate_inputs`]
    ///
    /// # Errors
    ///
    /// Returns error if the count is unacceptable
    fn validate_inputs(&self, _count: usize) -> CommandResult<()> {
        Ok(())
    }

    /// See [`Command::validate_outputs`]
    ///
    /// # Errors
    ///
    /// Returns error if the count is unacceptable
    fn validate_outputs(&self, _count: usize) -> CommandResult<()> {
        Ok(())
    }

    /// Hook invoked once during a global kill
    fn canceller(&self) -> Option<Canceller> {
        None
    }

    /// Interactive control event, already tokenized
    fn on_control_event(&self, _tokens: &[String]) {}
}

/// A constructed stage
pub enum CommandInstance {
    /// Private to one worker
    Exclusive(Box<dyn Command>),
    /// Shared across workers
    Shared(Arc<dyn SharedCommand>),
}

impl CommandInstance {
    /// Run the instance's input validator
    ///
    /// # Errors
    ///
    /// Returns the validator's error
    pub fn validate_inputs(&self, count: usize) -> CommandResult<()> {
        match self {
            Self::Exclusive(c) => c.validate_inputs(count),
            Self::Shared(c) => c.validate_inputs(count),
        }
    }

    /// Run the instance's output validator
    ///
    /// # Errors
    ///
    /// Returns the validator's error
    pub fn validate_outputs(&self, count: usize) -> CommandResult<()> {
        match self {
            Self::Exclusive(c) => c.validate_outputs(count),
            Self::Shared(c) => c.validate_outputs(count),
        }
    }

    /// Cancellation hook
    #[must_use]
    pub fn canceller(&self) -> Option<Canceller> {
        match self {
            Self::Exclusive(c) => c.canceller(),
            Self::Shared(c) => c.canceller(),
        }
    }

    /// Check for the shared variant
    #[must_use]
    pub const fn is_shared(&self) -> bool {
        matches!(self, Self::Shared(_))
    }
}

impl std::fmt::Debug for CommandInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exclusive(_) => write!(f, "CommandInstance::Exclusive"),
            Self::Shared(_) => write!(f, "CommandInstance::Shared"),
        }
    }
}

/// Reject an input count outside `range`, with the wording stages share
///
/// # Errors
///
/// Returns an arity error describing the requirement
pub fn require_at_least(count: usize, min: usize, what: &str) -> CommandResult<()> {
    if count < min {
        Err(CommandError::Arity(format!(
            "Specify at least {} {}",
            min, what
        )))
    } else {
        Ok(())
    }
}
