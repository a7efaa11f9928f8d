use thiserror::Error;

use crate::store::BoxError;

/// Failure of a single patch operation.
///
/// The engine halts at the first failing operation;
/// [`super::engine::BatchOutcome`] pairs one of these with the index it
/// occurred at.
#[derive(Error, Debug)]
pub enum PatchError {
    /// Malformed path string.
    #[error("invalid address '{path}'")]
    InvalidAddress { path: String },

    /// Insertion index outside `0..=len`.
    #[error("index {index} out of range at '{path}' (stack holds {len} blocks)")]
    IndexOutOfRange {
        path: String,
        index: usize,
        len: usize,
    },

    /// The referenced stack or block does not exist.
    #[error("nothing at '{path}'")]
    NotFound { path: String },

    /// Optimistic-concurrency guard mismatch.
    #[error("test failed at '{path}'")]
    TestFailed { path: String },

    /// Unrecognized operation kind.
    #[error("operation '{op}' is not implemented")]
    NotImplemented { op: String },

    /// A required field is missing or has the wrong shape.
    #[error("malformed '{op}' operation: {message}")]
    MalformedOperation { op: String, message: String },

    /// The storage adapter failed.
    #[error("storage error: {0}")]
    Store(BoxError),
}
