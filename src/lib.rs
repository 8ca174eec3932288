//! Personal-record roster sorter
//!
//! Reads a tab- or pipe-delimited file of people, keeps the rows with a usable
//! name, date of birth and SSN, drops duplicates, sorts what survives and
//! writes it back out as `name|dob|ssn` lines.
//!
//! ```text
//! bytes -> detect format -> [extract -> validate -> dedup] per chunk -> sort -> serialize
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]

pub mod config;
pub mod error;

pub mod compare;
pub mod dedup;
pub mod extract;
pub mod input;
pub mod locale;
pub mod logging;
pub mod pipeline;
pub mod record;
pub mod serialize;
pub mod validate;

pub use config::{DedupPolicy, DelimiterMode, GroupKey, RosterConfig, SortPolicy};
pub use error::{RosterError, RosterResult};
pub use pipeline::{Pipeline, RunContext, RunOutcome, RunStatistics};
pub use record::Record;

/// Exit codes
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const IO_FAILURE: i32 = 2;

/// Run the whole pipeline over an in-memory blob without yielding
pub fn process_bytes(input: &[u8], config: RosterConfig) -> RosterResult<RunOutcome> {
    let ctx = RunContext::new(config)?;
    Pipeline::new(&ctx, input).run(&mut pipeline::Immediate)
}

/// Serialize a finished run according to its configuration
pub fn render(outcome: &RunOutcome, config: &RosterConfig) -> String {
    serialize::serialize(&outcome.records, config.include_separators, config.group_key)
}
