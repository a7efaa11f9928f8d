use std::collections::{HashMap, HashSet};

use super::bed::{BedId, RaisedBed};
use crate::grid::Grid;
use crate::grid::block::BlockId;
use crate::grid::position::BlockPos;

/// Map every block in the grid to its full position (cell + height index).
pub fn position_index(grid: &Grid) -> HashMap<BlockId, BlockPos> {
    let mut index = HashMap::new();
    for (coord, stack) in grid.iter() {
        for (height, block) in stack.blocks().iter().enumerate() {
            index.insert(block.id.clone(), BlockPos::new(coord.x, coord.y, height));
        }
    }
    index
}

/// Undirected adjacency graph over raised beds.
///
/// An edge connects two beds whose blocks share a height index and sit in
/// orthogonally neighboring cells. A bed whose block has no position in
/// the grid is excluded from the graph entirely — it can never be part of
/// a pair.
pub struct AdjacencyGraph {
    positions: HashMap<BedId, BlockPos>,
    edges: HashMap<BedId, Vec<BedId>>,
}

impl AdjacencyGraph {
    pub fn build(grid: &Grid, beds: &[RaisedBed]) -> Self {
        let index = position_index(grid);

        let positions: HashMap<BedId, BlockPos> = beds
            .iter()
            .filter_map(|bed| index.get(&bed.block).map(|pos| (bed.id, *pos)))
            .collect();

        let placed: Vec<(BedId, BlockPos)> =
            positions.iter().map(|(id, pos)| (*id, *pos)).collect();

        let mut edges: HashMap<BedId, Vec<BedId>> = HashMap::new();
        for (i, (a, pos_a)) in placed.iter().enumerate() {
            for (b, pos_b) in &placed[i + 1..] {
                if pos_a.is_adjacent(pos_b) {
                    edges.entry(*a).or_default().push(*b);
                    edges.entry(*b).or_default().push(*a);
                }
            }
        }

        Self { positions, edges }
    }

    /// Position of a bed's block, if it resolved to a grid position.
    pub fn position(&self, bed: BedId) -> Option<BlockPos> {
        self.positions.get(&bed).copied()
    }

    pub fn neighbors(&self, bed: BedId) -> &[BedId] {
        self.edges.get(&bed).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, bed: BedId) -> bool {
        self.positions.contains_key(&bed)
    }

    /// Connected components, each a set of mutually reachable beds.
    ///
    /// Iterative depth-first traversal over unvisited nodes. Beds are
    /// visited in sorted id order so the grouping is deterministic for a
    /// given snapshot.
    pub fn components(&self) -> Vec<Vec<BedId>> {
        let mut ids: Vec<BedId> = self.positions.keys().copied().collect();
        ids.sort();

        let mut visited: HashSet<BedId> = HashSet::new();
        let mut components = Vec::new();

        for id in ids {
            if visited.contains(&id) {
                continue;
            }
            let mut component = Vec::new();
            let mut pending = vec![id];
            while let Some(current) = pending.pop() {
                if !visited.insert(current) {
                    continue;
                }
                component.push(current);
                for neighbor in self.neighbors(current) {
                    if !visited.contains(neighbor) {
                        pending.push(*neighbor);
                    }
                }
            }
            components.push(component);
        }

        components
    }
}

/// Derive the validity of every bed from a committed grid snapshot.
///
/// A bed is valid iff it belongs to a connected component of exactly two
/// beds. A lone bed (no neighbor) and an over-crowded cluster (three or
/// more) are both invalid, as is any bed whose block is not on the grid.
pub fn analyze(grid: &Grid, beds: &[RaisedBed]) -> HashMap<BedId, bool> {
    let graph = AdjacencyGraph::build(grid, beds);

    let mut validity: HashMap<BedId, bool> = beds.iter().map(|bed| (bed.id, false)).collect();
    for component in graph.components() {
        let valid = component.len() == 2;
        for id in component {
            validity.insert(id, valid);
        }
    }
    validity
}
