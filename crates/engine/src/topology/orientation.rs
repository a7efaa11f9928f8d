use serde::{Deserialize, Serialize};

use super::bed::{BedId, Orientation, RaisedBed};
use super::graph::AdjacencyGraph;
use crate::grid::Grid;

/// One orientation change to persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrientationUpdate {
    pub bed: BedId,
    pub orientation: Orientation,
}

/// Derive the geometric orientation of every bed and diff it against the
/// stored orientation, yielding only the beds that changed.
///
/// A bed with at least one adjacent bed sharing its row runs horizontally;
/// any other bed — column neighbor only, no neighbor, or block not on the
/// grid — is vertical. Emitting only the diff keeps write volume minimal
/// and makes reconciliation idempotent when the grid has not changed.
pub fn derive_updates(grid: &Grid, beds: &[RaisedBed]) -> Vec<OrientationUpdate> {
    let graph = AdjacencyGraph::build(grid, beds);

    beds.iter()
        .filter_map(|bed| {
            let derived = derived_orientation(&graph, bed.id);
            (derived != bed.orientation).then_some(OrientationUpdate {
                bed: bed.id,
                orientation: derived,
            })
        })
        .collect()
}

fn derived_orientation(graph: &AdjacencyGraph, bed: BedId) -> Orientation {
    let Some(pos) = graph.position(bed) else {
        return Orientation::Vertical;
    };

    let row_neighbor = graph.neighbors(bed).iter().any(|other| {
        graph
            .position(*other)
            .is_some_and(|other_pos| pos.shares_row(&other_pos))
    });

    if row_neighbor {
        Orientation::Horizontal
    } else {
        Orientation::Vertical
    }
}
