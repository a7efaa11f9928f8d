//! Block references and kind classification.
//!
//! Block entities (name, price, model) are owned by an external catalog;
//! the grid stores only references to them. The engine never follows a
//! reference — it moves them between stacks and classifies them by the
//! denormalized kind tag.

use serde::{Deserialize, Serialize};

/// Opaque identifier for a placed block, issued by an external collaborator.
/// The engine stores these without interpreting them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub String);

impl BlockId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind name of blocks that raised-bed structures attach to.
pub const RAISED_BED_KIND: &str = "raised_bed";

/// A reference to a placed block: the opaque id plus the block's kind name,
/// denormalized so classification never needs a catalog lookup.
///
/// Identity is the id alone. The kind tag is excluded from equality and
/// hashing, so a wire value carrying only the id compares equal to the
/// stored ref.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "BlockRefWire", into = "BlockRefWire")]
pub struct BlockRef {
    pub id: BlockId,
    pub kind: String,
}

impl BlockRef {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: BlockId::new(id),
            kind: kind.into(),
        }
    }

    /// A ref carrying only the id (wire shorthand; kind unknown).
    pub fn bare(id: impl Into<String>) -> Self {
        Self::new(id, "")
    }

    pub fn is_raised_bed(&self) -> bool {
        self.kind == RAISED_BED_KIND
    }
}

impl PartialEq for BlockRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for BlockRef {}

impl std::hash::Hash for BlockRef {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Wire shape: either a bare id string or `{ "id": ..., "kind": ... }`.
#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum BlockRefWire {
    Id(String),
    Full {
        id: String,
        #[serde(default)]
        kind: String,
    },
}

impl From<BlockRefWire> for BlockRef {
    fn from(wire: BlockRefWire) -> Self {
        match wire {
            BlockRefWire::Id(id) => BlockRef::bare(id),
            BlockRefWire::Full { id, kind } => BlockRef::new(id, kind),
        }
    }
}

impl From<BlockRef> for BlockRefWire {
    fn from(block: BlockRef) -> Self {
        BlockRefWire::Full {
            id: block.id.0,
            kind: block.kind,
        }
    }
}
