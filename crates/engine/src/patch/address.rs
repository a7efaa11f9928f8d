use super::error::PatchError;
use crate::grid::position::Coord;

/// Parsed form of a patch path.
///
/// The grammar is `/{x}/{y}` (whole stack), `/{x}/{y}/{index}` (one block)
/// or `/{x}/{y}/-` (one past the top, insertion target only). Coordinates
/// are signed; an index is non-negative. Parsing has no side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Address {
    Stack { coord: Coord },
    Element { coord: Coord, index: usize },
    Append { coord: Coord },
}

impl Address {
    pub fn parse(path: &str) -> Result<Self, PatchError> {
        let invalid = || PatchError::InvalidAddress {
            path: path.to_string(),
        };

        let rest = path.strip_prefix('/').ok_or_else(invalid)?;
        let segments: Vec<&str> = rest.split('/').collect();

        match segments.as_slice() {
            [x, y] => Ok(Address::Stack {
                coord: parse_coord(x, y).ok_or_else(invalid)?,
            }),
            [x, y, "-"] => Ok(Address::Append {
                coord: parse_coord(x, y).ok_or_else(invalid)?,
            }),
            [x, y, index] => Ok(Address::Element {
                coord: parse_coord(x, y).ok_or_else(invalid)?,
                index: index.parse().map_err(|_| invalid())?,
            }),
            _ => Err(invalid()),
        }
    }

    pub const fn coord(&self) -> Coord {
        match self {
            Address::Stack { coord }
            | Address::Element { coord, .. }
            | Address::Append { coord } => *coord,
        }
    }
}

fn parse_coord(x: &str, y: &str) -> Option<Coord> {
    Some(Coord::new(x.parse().ok()?, y.parse().ok()?))
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Address::Stack { coord } => write!(f, "/{}/{}", coord.x, coord.y),
            Address::Element { coord, index } => write!(f, "/{}/{}/{}", coord.x, coord.y, index),
            Address::Append { coord } => write!(f, "/{}/{}/-", coord.x, coord.y),
        }
    }
}
