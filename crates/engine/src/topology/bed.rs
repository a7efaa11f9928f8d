use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::grid::block::BlockId;

/// Identifies one raised-bed structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BedId(pub Uuid);

impl BedId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for BedId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Which axis a raised-bed pair runs along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    #[default]
    Vertical,
}

/// A raised-bed structure, attached to exactly one placed block.
///
/// Orientation is the only derived field the store persists — neighbors
/// rarely change between reads, so it is cached and reconciled after each
/// committed batch. Validity is recomputed from the grid every time and
/// never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaisedBed {
    pub id: BedId,
    /// The block this bed is attached to.
    pub block: BlockId,
    #[serde(default)]
    pub orientation: Orientation,
}

impl RaisedBed {
    pub fn new(id: BedId, block: BlockId) -> Self {
        Self {
            id,
            block,
            orientation: Orientation::default(),
        }
    }
}
