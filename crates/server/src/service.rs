//! Garden orchestration facade.
//!
//! The two entry points the surrounding application calls: apply a patch
//! batch, and reconcile the derived raised-bed metadata afterwards. The
//! HTTP layer, auth and the rest of the CRUD surface live outside this
//! crate and talk to [`GardenService`] only.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};

use garden_engine::patch::{BatchOutcome, PatchEngine, RawOperation};
use garden_engine::store::{BoxError, GardenId, GridStore, RaisedBedStore};
use garden_engine::topology::bed::BedId;
use garden_engine::topology::graph;
use garden_engine::topology::orientation::{self, OrientationUpdate};

/// Result of one reconciliation pass.
#[derive(Debug)]
pub struct ReconcileReport {
    /// Derived validity per bed — recomputed every time, never persisted.
    pub validity: HashMap<BedId, bool>,
    /// Orientation changes that were written back to the store.
    pub updates: Vec<OrientationUpdate>,
}

/// Result of a mutate call: the batch outcome plus the reconciliation that
/// followed it (absent when no operation committed).
#[derive(Debug)]
pub struct MutationReport {
    pub outcome: BatchOutcome,
    pub reconcile: Option<ReconcileReport>,
}

pub struct GardenService<S> {
    store: Arc<S>,
}

impl<S> GardenService<S>
where
    S: GridStore + RaisedBedStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Apply an ordered patch batch against one garden's grid.
    ///
    /// Partial failure is reported, not rolled back: the outcome names the
    /// failing operation's index and everything before it stays committed.
    pub async fn apply_batch(&self, garden: GardenId, batch: &[RawOperation]) -> BatchOutcome {
        let outcome = PatchEngine::new(self.store.as_ref(), garden)
            .apply(batch)
            .await;
        match &outcome {
            BatchOutcome::Applied { operations } => {
                tracing::info!("garden {}: applied {} operations", garden, operations);
            }
            BatchOutcome::FailedAt { index, error } => {
                tracing::warn!(
                    "garden {}: batch failed at operation {}: {}",
                    garden,
                    index,
                    error,
                );
            }
        }
        outcome
    }

    /// Bring derived raised-bed metadata back into consistency with the
    /// committed grid: recompute validity and persist the orientations
    /// that changed.
    ///
    /// Must only run against a committed snapshot, never interleaved with
    /// a batch. Repeating it with no grid change writes nothing.
    pub async fn reconcile(&self, garden: GardenId) -> Result<ReconcileReport> {
        let grid = self
            .store
            .load_grid(garden)
            .await
            .map_err(store_err)
            .context("loading grid snapshot")?;
        let beds = self
            .store
            .raised_beds(garden)
            .await
            .map_err(store_err)
            .context("loading raised beds")?;

        let validity = graph::analyze(&grid, &beds);
        let updates = orientation::derive_updates(&grid, &beds);

        for update in &updates {
            self.store
                .update_orientation(update.bed, update.orientation)
                .await
                .map_err(store_err)
                .with_context(|| format!("persisting orientation of bed {}", update.bed))?;
        }

        let valid = validity.values().filter(|v| **v).count();
        tracing::info!(
            "garden {}: reconciled {} beds ({} valid, {} orientation updates)",
            garden,
            beds.len(),
            valid,
            updates.len(),
        );

        Ok(ReconcileReport { validity, updates })
    }

    /// Apply a batch, then reconcile whenever at least one operation
    /// committed — a partial failure has still moved the grid.
    pub async fn mutate(&self, garden: GardenId, batch: &[RawOperation]) -> Result<MutationReport> {
        let outcome = self.apply_batch(garden, batch).await;
        let reconcile = if outcome.applied_count() > 0 {
            Some(self.reconcile(garden).await?)
        } else {
            None
        };
        Ok(MutationReport { outcome, reconcile })
    }
}

fn store_err(error: BoxError) -> anyhow::Error {
    anyhow::anyhow!(error)
}
