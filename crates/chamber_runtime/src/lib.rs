//! CHAMBER Runtime
//!
//! Execution engine for compiled pipeline scripts. Each statement becomes a
//! [`Processor`] that reassembles multi-input tuples by order id, bounds
//! out-of-order work with a completion window, and ends its stream in step
//! with its producers. [`DistributorVariable`] edges fan values out, and the
//! [`RunController`] owns worker threads, the pause gate and global kill.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backpressure;
pub mod config;
pub mod controller;
pub mod distributor;
pub mod error;
pub mod executor;
pub mod gate;
pub mod graph;
pub mod monitor;
pub mod processor;

pub use backpressure::CompletionWindow;
pub use config::{ConfigError, RunConfig};
pub use controller::{KillSwitch, RunController, RunHandle};
pub use distributor::DistributorVariable;
pub use error::{BuildError, BuildErrorKind, SpawnError, StageFailure};
pub use gate::PauseGate;
pub use graph::{Graph, GraphBuilder};
pub use monitor::{RunOutcome, RunReport, StageSummary};
pub use processor::{Processor, Step};
