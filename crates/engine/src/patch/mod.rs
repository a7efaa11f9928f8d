//! The grid patch protocol.
//!
//! A batch is an ordered list of RFC-6902-style operations addressed by
//! the `/{x}/{y}[/{index}|/-]` grammar. The engine interprets them one at
//! a time against the store and stops at the first failure.

pub mod address;
pub mod engine;
pub mod error;
pub mod op;

pub use address::Address;
pub use engine::{BatchOutcome, PatchEngine};
pub use error::PatchError;
pub use op::{Operation, PatchValue, RawOperation};
