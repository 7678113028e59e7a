pub mod config;
pub mod error;
pub mod logging;

// Validation pipeline, leaf modules first
pub mod streaming;
pub mod digest;
pub mod progress;
pub mod units;
pub mod objects;
pub mod target;
pub mod check;
pub mod crvd;
pub mod keys;
pub mod suite;

pub use error::{Error, Result};
