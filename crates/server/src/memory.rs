//! Reference in-memory store.
//!
//! Backs the tests and the demo binary; a real deployment implements the
//! same contracts over its own persistence. Thread-safe, lock-sharded by
//! key — methods take `&self` because `DashMap` provides interior
//! mutability via per-shard locking.

use async_trait::async_trait;
use dashmap::DashMap;

use garden_engine::grid::Grid;
use garden_engine::grid::block::BlockRef;
use garden_engine::grid::position::Coord;
use garden_engine::grid::stack::Stack;
use garden_engine::store::{BoxError, GardenId, GridStore, RaisedBedStore};
use garden_engine::topology::bed::{BedId, Orientation, RaisedBed};

#[derive(Default)]
pub struct MemoryStore {
    stacks: DashMap<(GardenId, Coord), Stack>,
    beds: DashMap<BedId, (GardenId, RaisedBed)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Seeding and inspection (tests, demo) ────────────────────────────

    pub fn seed_stack(&self, garden: GardenId, coord: Coord, blocks: Vec<BlockRef>) {
        self.stacks
            .insert((garden, coord), Stack::from_blocks(blocks));
    }

    pub fn seed_bed(&self, garden: GardenId, bed: RaisedBed) {
        self.beds.insert(bed.id, (garden, bed));
    }

    pub fn bed(&self, id: BedId) -> Option<RaisedBed> {
        self.beds.get(&id).map(|entry| entry.1.clone())
    }

    pub fn stack_count(&self, garden: GardenId) -> usize {
        self.stacks
            .iter()
            .filter(|entry| entry.key().0 == garden)
            .count()
    }
}

#[async_trait]
impl GridStore for MemoryStore {
    async fn get_stack(&self, garden: GardenId, coord: Coord) -> Result<Option<Stack>, BoxError> {
        Ok(self
            .stacks
            .get(&(garden, coord))
            .map(|entry| entry.value().clone()))
    }

    async fn create_stack(&self, garden: GardenId, coord: Coord) -> Result<(), BoxError> {
        self.stacks.entry((garden, coord)).or_default();
        Ok(())
    }

    async fn update_stack(
        &self,
        garden: GardenId,
        coord: Coord,
        blocks: Vec<BlockRef>,
    ) -> Result<(), BoxError> {
        self.stacks
            .insert((garden, coord), Stack::from_blocks(blocks));
        Ok(())
    }

    async fn delete_stack(&self, garden: GardenId, coord: Coord) -> Result<(), BoxError> {
        self.stacks.remove(&(garden, coord));
        Ok(())
    }

    async fn load_grid(&self, garden: GardenId) -> Result<Grid, BoxError> {
        let mut grid = Grid::new();
        for entry in self.stacks.iter() {
            let (entry_garden, coord) = *entry.key();
            if entry_garden == garden {
                grid.insert_stack(coord, entry.value().clone());
            }
        }
        Ok(grid)
    }
}

#[async_trait]
impl RaisedBedStore for MemoryStore {
    async fn raised_beds(&self, garden: GardenId) -> Result<Vec<RaisedBed>, BoxError> {
        let mut beds: Vec<RaisedBed> = self
            .beds
            .iter()
            .filter(|entry| entry.0 == garden)
            .map(|entry| entry.1.clone())
            .collect();
        // Deterministic order for reports and logs.
        beds.sort_by_key(|bed| bed.id);
        Ok(beds)
    }

    async fn update_orientation(
        &self,
        bed: BedId,
        orientation: Orientation,
    ) -> Result<(), BoxError> {
        match self.beds.get_mut(&bed) {
            Some(mut entry) => {
                entry.1.orientation = orientation;
                Ok(())
            }
            None => Err(format!("no raised bed {bed}").into()),
        }
    }
}
