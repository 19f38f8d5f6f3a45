//! CHAMBER Core Types
//!
//! This crate contains pure types shared by every stage of the pipeline
//! engine: the values that flow through the graph, the options taken from
//! script statements, and the order ids that correlate tuples.
//! Nothing here performs I/O.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod options;
pub mod order;
pub mod value;

// Re-exports
pub use error::{CoreError, CoreResult};
pub use options::{OptionValue, Options};
pub use order::OrderId;
pub use value::{Tuple, Value};
