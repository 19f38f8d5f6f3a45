//! CHAMBER Command System
//!
//! The contract every pipeline stage implements, the static descriptors the
//! engine reads when it compiles a statement, and the registry that maps
//! command names to constructors. Built-in stages live in [`builtin`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builtin;
pub mod command;
pub mod descriptor;
pub mod error;
pub mod registry;

pub use command::{Canceller, Command, CommandInstance, Emit, SharedCommand};
pub use descriptor::{Arity, CommandDescriptor, Concurrency};
pub use error::{CommandError, CommandResult};
pub use registry::{CommandArgs, CommandEntry, CommandRegistry, RegistryError};
