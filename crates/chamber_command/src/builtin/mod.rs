//! Built-in stages.

mod read;
mod seq;
mod watch;

pub use read::Read;
pub use seq::Seq;
pub use watch::Watch;

use crate::registry::CommandEntry;

/// Registry entries for every built-in stage
#[must_use]
pub fn entries() -> Vec<CommandEntry> {
    vec![Seq::entry(), Read::entry(), Watch::entry()]
}
