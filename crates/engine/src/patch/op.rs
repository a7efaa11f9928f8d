use serde::{Deserialize, Serialize};

use super::address::Address;
use super::error::PatchError;
use crate::grid::block::BlockRef;

/// One operation as it arrives on the wire: the RFC 6902 shape adapted to
/// the grid address grammar. `add`, `replace` and `test` carry `value`;
/// `move` and `copy` carry `from`; `remove` carries neither.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawOperation {
    pub op: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<PatchValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

impl RawOperation {
    pub fn add(path: impl Into<String>, value: impl Into<PatchValue>) -> Self {
        Self::with_value("add", path, value)
    }

    pub fn remove(path: impl Into<String>) -> Self {
        Self {
            op: "remove".into(),
            path: path.into(),
            value: None,
            from: None,
        }
    }

    pub fn replace(path: impl Into<String>, value: impl Into<PatchValue>) -> Self {
        Self::with_value("replace", path, value)
    }

    pub fn test(path: impl Into<String>, value: impl Into<PatchValue>) -> Self {
        Self::with_value("test", path, value)
    }

    pub fn move_from(path: impl Into<String>, from: impl Into<String>) -> Self {
        Self::with_from("move", path, from)
    }

    pub fn copy_from(path: impl Into<String>, from: impl Into<String>) -> Self {
        Self::with_from("copy", path, from)
    }

    fn with_value(op: &str, path: impl Into<String>, value: impl Into<PatchValue>) -> Self {
        Self {
            op: op.into(),
            path: path.into(),
            value: Some(value.into()),
            from: None,
        }
    }

    fn with_from(op: &str, path: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            op: op.into(),
            path: path.into(),
            value: None,
            from: Some(from.into()),
        }
    }
}

/// Operation payload: a single block ref or an ordered list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatchValue {
    One(BlockRef),
    Many(Vec<BlockRef>),
}

impl PatchValue {
    /// Normalize to a block list; a single ref becomes a one-element list.
    pub fn into_blocks(self) -> Vec<BlockRef> {
        match self {
            PatchValue::One(block) => vec![block],
            PatchValue::Many(blocks) => blocks,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            PatchValue::One(_) => 1,
            PatchValue::Many(blocks) => blocks.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<BlockRef> for PatchValue {
    fn from(block: BlockRef) -> Self {
        PatchValue::One(block)
    }
}

impl From<Vec<BlockRef>> for PatchValue {
    fn from(blocks: Vec<BlockRef>) -> Self {
        PatchValue::Many(blocks)
    }
}

/// A resolved operation: the closed set the engine matches exhaustively,
/// so a new kind is a compile-time decision rather than a stringly branch.
#[derive(Debug, Clone)]
pub enum Operation {
    Add { address: Address, value: PatchValue },
    Remove { address: Address },
    Replace { address: Address, value: PatchValue },
    Move { address: Address, from: Address },
    Copy { address: Address, from: Address },
    Test { address: Address, value: PatchValue },
}

impl Operation {
    /// Resolve the wire form: reject unknown kinds, parse the addresses,
    /// and check required fields.
    pub fn resolve(raw: &RawOperation) -> Result<Self, PatchError> {
        match raw.op.as_str() {
            "add" => Ok(Operation::Add {
                address: Address::parse(&raw.path)?,
                value: require_value(raw)?,
            }),
            "remove" => Ok(Operation::Remove {
                address: Address::parse(&raw.path)?,
            }),
            "replace" => Ok(Operation::Replace {
                address: Address::parse(&raw.path)?,
                value: require_value(raw)?,
            }),
            "move" => Ok(Operation::Move {
                address: Address::parse(&raw.path)?,
                from: require_from(raw)?,
            }),
            "copy" => Ok(Operation::Copy {
                address: Address::parse(&raw.path)?,
                from: require_from(raw)?,
            }),
            "test" => Ok(Operation::Test {
                address: Address::parse(&raw.path)?,
                value: require_value(raw)?,
            }),
            other => Err(PatchError::NotImplemented {
                op: other.to_string(),
            }),
        }
    }
}

fn require_value(raw: &RawOperation) -> Result<PatchValue, PatchError> {
    raw.value.clone().ok_or_else(|| PatchError::MalformedOperation {
        op: raw.op.clone(),
        message: "missing 'value'".into(),
    })
}

fn require_from(raw: &RawOperation) -> Result<Address, PatchError> {
    let from = raw
        .from
        .as_deref()
        .ok_or_else(|| PatchError::MalformedOperation {
            op: raw.op.clone(),
            message: "missing 'from'".into(),
        })?;
    Address::parse(from)
}
