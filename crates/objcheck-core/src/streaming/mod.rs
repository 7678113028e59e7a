//! Range math and exact-length transfers.
//!
//! Plans the byte windows of a ranged download and makes every chunked read
//! or write all-or-nothing at the byte-count level.

mod exact;
mod range;

pub use exact::{read_exactly, write_exactly};
pub use range::{next_range, plan_ranges, RangePlan, TransferRange, DEFAULT_RANGE_SIZE};
