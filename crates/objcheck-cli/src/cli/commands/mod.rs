//! CLI command handlers. Each command is in its own file.

mod check;
mod completions;
mod crvd;
mod keys;
mod suite;

pub use check::run_check;
pub use completions::{run_completions, run_man};
pub use crvd::run_crvd;
pub use keys::run_keys;
pub use suite::run_suite;

#[cfg(test)]
pub(crate) use suite::count_limit;
