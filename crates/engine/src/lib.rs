//! Garden grid mutation engine.
//!
//! The engine owns the algorithmic heart of the garden builder: a batch
//! patch protocol over a sparse 2D grid of block stacks (`patch`), and the
//! derived raised-bed topology that follows every committed batch
//! (`topology`). Persistence, auth, pricing and the HTTP surface live in
//! the host application; the engine reaches storage only through the
//! async contracts in `store`.

pub mod grid;
pub mod patch;
pub mod store;
pub mod topology;
