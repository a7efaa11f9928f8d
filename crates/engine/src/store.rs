//! Storage contracts the engine mutates through.
//!
//! Persistence is an external collaborator; these traits are the narrow
//! interface the protocol needs from it. The engine awaits each call
//! before issuing the next — later operations in a batch may depend on
//! the state left by earlier ones, so there is never concurrent fan-out
//! within a batch. Serializing concurrent writers per garden is the
//! store's responsibility, not the engine's.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::grid::Grid;
use crate::grid::block::BlockRef;
use crate::grid::position::Coord;
use crate::grid::stack::Stack;
use crate::topology::bed::{BedId, Orientation, RaisedBed};

/// Adapter failures are opaque to the protocol; the engine wraps them
/// into [`crate::patch::error::PatchError::Store`] unchanged.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Identifies one garden (one grid plus its raised beds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GardenId(pub Uuid);

impl GardenId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for GardenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Per-coordinate stack storage.
#[async_trait]
pub trait GridStore: Send + Sync {
    /// Read the stack at a cell; `None` means the cell is empty.
    async fn get_stack(&self, garden: GardenId, coord: Coord) -> Result<Option<Stack>, BoxError>;

    /// Create an empty stack at a cell that has none.
    async fn create_stack(&self, garden: GardenId, coord: Coord) -> Result<(), BoxError>;

    /// Overwrite the block sequence of an existing stack.
    async fn update_stack(
        &self,
        garden: GardenId,
        coord: Coord,
        blocks: Vec<BlockRef>,
    ) -> Result<(), BoxError>;

    /// Delete the stack at a cell entirely.
    async fn delete_stack(&self, garden: GardenId, coord: Coord) -> Result<(), BoxError>;

    /// Load the whole grid as an immutable snapshot for topology analysis.
    /// Must only be called after a batch has fully committed.
    async fn load_grid(&self, garden: GardenId) -> Result<Grid, BoxError>;
}

/// Raised-bed entity storage. The engine reads the full set and writes
/// back only orientation changes; validity is derived and never persisted.
#[async_trait]
pub trait RaisedBedStore: Send + Sync {
    async fn raised_beds(&self, garden: GardenId) -> Result<Vec<RaisedBed>, BoxError>;

    async fn update_orientation(
        &self,
        bed: BedId,
        orientation: Orientation,
    ) -> Result<(), BoxError>;
}
