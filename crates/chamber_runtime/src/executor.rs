//! Stage invocation.
//!
//! Holds a processor's stage instances and calls into them on behalf of a
//! worker. Panics inside stage logic are caught here and surface as faults,
//! like returned errors.

use chamber_command::{Canceller, Command, CommandError, CommandInstance, Emit, SharedCommand};
use chamber_core::Tuple;
use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Failure raised by stage logic
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Stage returned an error
    Failed(CommandError),
    /// Stage panicked; payload rendered as text
    Panicked(String),
}

impl Fault {
    /// Human-readable message
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Failed(err) => err.to_string(),
            Self::Panicked(payload) => format!("stage panicked: {}", payload),
        }
    }

    /// Diagnostic trace, when the stage provided one
    #[must_use]
    pub fn trace(&self) -> Option<String> {
        match self {
            Self::Failed(err) => err.trace().map(str::to_string),
            Self::Panicked(_) => None,
        }
    }
}

/// A processor's stage instances
pub enum StageSet {
    /// One private instance per worker, or a single one for sequential stages
    Exclusive(Vec<Mutex<Box<dyn Command>>>),
    /// One instance shared by every worker
    Shared(Arc<dyn SharedCommand>),
}

impl StageSet {
    /// Group constructed instances
    ///
    /// Instances are all of one kind; the registry rejects mixed sets.
    #[must_use]
    pub fn from_instances(instances: Vec<CommandInstance>) -> Self {
        let mut exclusive = Vec::with_capacity(instances.len());
        for instance in instances {
            match instance {
                CommandInstance::Shared(shared) => return Self::Shared(shared),
                CommandInstance::Exclusive(command) => exclusive.push(Mutex::new(command)),
            }
        }
        Self::Exclusive(exclusive)
    }

    /// Number of held instances
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Exclusive(commands) => commands.len(),
            Self::Shared(_) => 1,
        }
    }

    /// Check for an empty set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run stage logic for one tuple on behalf of `worker`
    ///
    /// # Errors
    ///
    /// Returns the stage's error, or its panic payload
    pub fn invoke(&self, worker: usize, input: Tuple) -> Result<Emit, Fault> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| match self {
            Self::Shared(shared) => shared.execute(worker, input),
            Self::Exclusive(commands) => {
                let index = if commands.len() == 1 { 0 } else { worker };
                match commands.get(index) {
                    Some(command) => command.lock().execute(input),
                    None => Err(CommandError::failed(format!("no stage instance for worker {}", worker))),
                }
            }
        }));

        match outcome {
            Ok(result) => result.map_err(Fault::Failed),
            Err(payload) => Err(Fault::Panicked(panic_message(payload.as_ref()))),
        }
    }

    /// Forward a control event to every instance
    ///
    /// Exclusive instances busy in `execute` miss the event, so a stage
    /// blocked on input never holds up the caller.
    pub fn control(&self, tokens: &[String]) {
        match self {
            Self::Shared(shared) => shared.on_control_event(tokens),
            Self::Exclusive(commands) => {
                for (index, command) in commands.iter().enumerate() {
                    match command.try_lock() {
                        Some(mut command) => command.on_control_event(tokens),
                        None => tracing::debug!(instance = index, "busy stage instance skipped control event"),
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for StageSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exclusive(commands) => write!(f, "StageSet::Exclusive({})", commands.len()),
            Self::Shared(_) => write!(f, "StageSet::Shared"),
        }
    }
}

/// Collect cancellation hooks before instances are moved into a set
#[must_use]
pub fn cancellers(instances: &[CommandInstance]) -> Vec<Canceller> {
    instances.iter().filter_map(CommandInstance::canceller).collect()
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chamber_command::CommandResult;
    use chamber_core::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Echo;

    impl Command for Echo {
        fn execute(&mut self, input: Tuple) -> CommandResult<Emit> {
            Ok(Emit::Tuple(input))
        }
    }

    struct Boom;

    impl Command for Boom {
        fn execute(&mut self, _input: Tuple) -> CommandResult<Emit> {
            panic!("boom");
        }
    }

    struct Counter(AtomicUsize);

    impl SharedCommand for Counter {
        fn execute(&self, worker: usize, _input: Tuple) -> CommandResult<Emit> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(Emit::one(worker as i64))
        }

        fn on_control_event(&self, _tokens: &[String]) {
            self.0.store(100, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_exclusive_single_instance() {
        let set = StageSet::from_instances(vec![CommandInstance::Exclusive(Box::new(Echo))]);
        assert_eq!(set.len(), 1);
        // Any worker index maps onto the single instance
        let out = set.invoke(5, vec![Value::Int(1)]).unwrap();
        assert_eq!(out, Emit::one(1_i64));
    }

    #[test]
    fn test_shared_gets_worker_index() {
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let set = StageSet::from_instances(vec![CommandInstance::Shared(counter.clone())]);
        assert_eq!(set.invoke(3, vec![]).unwrap(), Emit::one(3_i64));
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);

        set.control(&["watch".to_string()]);
        assert_eq!(counter.0.load(Ordering::SeqCst), 100);
    }

    struct Listener(Arc<Mutex<Vec<String>>>);

    impl Command for Listener {
        fn execute(&mut self, _input: Tuple) -> CommandResult<Emit> {
            Ok(Emit::empty())
        }

        fn on_control_event(&mut self, tokens: &[String]) {
            self.0.lock().push(tokens.join(" "));
        }
    }

    #[test]
    fn test_control_skips_busy_instance() {
        let logs: Vec<Arc<Mutex<Vec<String>>>> = (0..2).map(|_| Arc::default()).collect();
        let set = StageSet::from_instances(
            logs.iter()
                .map(|log| CommandInstance::Exclusive(Box::new(Listener(Arc::clone(log)))))
                .collect(),
        );
        let StageSet::Exclusive(commands) = &set else {
            panic!("expected exclusive instances");
        };

        // Instance 0 is held as if stuck in execute
        let busy = commands[0].lock();
        set.control(&["watch".to_string()]);
        drop(busy);
        set.control(&["pause".to_string()]);

        assert_eq!(logs[0].lock().clone(), vec!["pause".to_string()]);
        assert_eq!(logs[1].lock().clone(), vec!["watch".to_string(), "pause".to_string()]);
    }

    #[test]
    fn test_panic_becomes_fault() {
        let set = StageSet::from_instances(vec![CommandInstance::Exclusive(Box::new(Boom))]);
        let fault = set.invoke(0, vec![]).unwrap_err();
        assert_eq!(fault, Fault::Panicked("boom".to_string()));
        assert_eq!(fault.message(), "stage panicked: boom");
        assert_eq!(fault.trace(), None);
    }

    #[test]
    fn test_missing_worker_instance() {
        let set = StageSet::from_instances(vec![
            CommandInstance::Exclusive(Box::new(Echo)),
            CommandInstance::Exclusive(Box::new(Echo)),
        ]);
        assert!(matches!(set.invoke(7, vec![]), Err(Fault::Failed(_))));
    }
}
