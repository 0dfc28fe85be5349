//! Channel layer: pattern matching and the incremental read loop.
//!
//! This is the core of the automation engine. It infers command boundaries
//! from unstructured terminal bytes: matchers built from escaped literals,
//! an edit-distance check for prompt stability, and a tick-based
//! non-blocking read loop with a time budget.

mod distance;
mod patterns;
mod reader;

pub use distance::edit_distance;
pub use patterns::{escape, Matcher};
pub use reader::{read_channel, CompletionStatus, ReadOptions, ReadOutcome, TimeBudget};
