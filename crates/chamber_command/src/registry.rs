//! Command registry for name-based stage lookup.
//!
//! Two layers are kept: extensions registered by the embedding application,
//! and the built-in stages. Lookup consults extensions first, so an
//! extension may shadow a built-in of the same name.

use chamber_core::Options;
use indexmap::IndexMap;
use std::sync::Arc;

use crate::builtin;
use crate::command::{Command, CommandInstance, SharedCommand};
use crate::descriptor::{CommandDescriptor, Concurrency};
use crate::error::{CommandError, CommandResult};

/// Error from registry operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Name already taken within the same layer
    #[error("Command already registered: {name}")]
    AlreadyRegistered {
        /// Command name
        name: String,
    },
}

/// Arguments handed to a stage constructor
#[derive(Debug, Clone, Copy)]
pub struct CommandArgs<'a> {
    /// Options from the statement
    pub options: &'a Options,
    /// Configured worker count for the statement
    pub threads: usize,
}

type Factory = Arc<dyn Fn(&CommandArgs<'_>) -> CommandResult<CommandInstance> + Send + Sync>;

/// Entry for a registered command
#[derive(Clone)]
pub struct CommandEntry {
    /// Static descriptor
    pub descriptor: CommandDescriptor,
    factory: Factory,
}

impl CommandEntry {
    /// Entry whose instances are owned by one worker each
    #[must_use]
    pub fn exclusive<C, F>(descriptor: CommandDescriptor, build: F) -> Self
    where
        C: Command + 'static,
        F: Fn(&CommandArgs<'_>) -> CommandResult<C> + Send + Sync + 'static,
    {
        Self {
            descriptor,
            factory: Arc::new(move |args| Ok(CommandInstance::Exclusive(Box::new(build(args)?)))),
        }
    }

    /// Entry whose single instance is shared by all workers
    #[must_use]
    pub fn shared<C, F>(descriptor: CommandDescriptor, build: F) -> Self
    where
        C: SharedCommand + 'static,
        F: Fn(&CommandArgs<'_>) -> CommandResult<C> + Send + Sync + 'static,
    {
        let descriptor = descriptor.with_concurrency(Concurrency::SharedParallel);
        Self {
            descriptor,
            factory: Arc::new(move |args| Ok(CommandInstance::Shared(Arc::new(build(args)?)))),
        }
    }

    /// Command name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Construct every instance a processor with `threads` workers needs
    ///
    /// # Errors
    ///
    /// Returns error if any construction fails
    pub fn instantiate(&self, options: &Options, threads: usize) -> CommandResult<Vec<CommandInstance>> {
        let args = CommandArgs { options, threads };
        let count = self.descriptor.concurrency.instances(threads).max(1);
        let instances = (0..count)
            .map(|_| (self.factory)(&args))
            .collect::<CommandResult<Vec<_>>>()?;

        let shared = self.descriptor.concurrency.share_resources();
        if instances.iter().any(|i| i.is_shared() != shared) {
            return Err(CommandError::Construction(format!(
                "Command \"{}\" built an instance that does not match its concurrency mode",
                self.name()
            )));
        }
        Ok(instances)
    }
}

impl std::fmt::Debug for CommandEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandEntry")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Registry for commands
pub struct CommandRegistry {
    extensions: IndexMap<String, CommandEntry>,
    builtins: IndexMap<String, CommandEntry>,
}

impl CommandRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            extensions: IndexMap::new(),
            builtins: IndexMap::new(),
        }
    }

    /// Create a registry holding the built-in stages
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for entry in builtin::entries() {
            registry.builtins.insert(entry.name().to_string(), entry);
        }
        registry
    }

    /// Register an extension command
    ///
    /// # Errors
    ///
    /// Returns error if an extension with this name already exists
    pub fn register_extension(&mut self, entry: CommandEntry) -> Result<(), RegistryError> {
        Self::insert(&mut self.extensions, entry)
    }

    /// Register a built-in command
    ///
    /// # Errors
    ///
    /// Returns error if a built-in with this name already exists
    pub fn register_builtin(&mut self, entry: CommandEntry) -> Result<(), RegistryError> {
        Self::insert(&mut self.builtins, entry)
    }

    fn insert(layer: &mut IndexMap<String, CommandEntry>, entry: CommandEntry) -> Result<(), RegistryError> {
        let name = entry.name().to_string();
        if layer.contains_key(&name) {
            return Err(RegistryError::AlreadyRegistered { name });
        }
        layer.insert(name, entry);
        Ok(())
    }

    /// Resolve a command by name, extensions first
    ///
    /// # Errors
    ///
    /// Returns error if no layer knows the name
    pub fn resolve(&self, name: &str) -> CommandResult<&CommandEntry> {
        self.extensions
            .get(name)
            .or_else(|| self.builtins.get(name))
            .ok_or_else(|| CommandError::UnknownCommand {
                name: name.to_string(),
            })
    }

    /// Check if a command is registered in any layer
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.extensions.contains_key(name) || self.builtins.contains_key(name)
    }

    /// All resolvable names, extensions first, without duplicates
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.extensions.keys().cloned().collect();
        for name in self.builtins.keys() {
            if !self.extensions.contains_key(name) {
                names.push(name.clone());
            }
        }
        names
    }

    /// Number of resolvable names
    #[must_use]
    pub fn count(&self) -> usize {
        self.list().len()
    }

    /// Check if registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty() && self.builtins.is_empty()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
