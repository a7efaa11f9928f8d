use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use garden_engine::grid::block::{BlockId, BlockRef, RAISED_BED_KIND};
use garden_engine::patch::{BatchOutcome, RawOperation};
use garden_engine::store::GardenId;
use garden_engine::topology::bed::{BedId, RaisedBed};
use garden_server::memory::MemoryStore;
use garden_server::service::GardenService;

#[tokio::main]
async fn main() -> Result<()> {
    let batch_file: Option<PathBuf> = std::env::args()
        .skip_while(|a| a != "--batch")
        .nth(1)
        .map(Into::into);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".parse().unwrap()),
        )
        .init();

    tracing::info!("Garden grid service -- patch protocol demo");

    let batch: Vec<RawOperation> = match &batch_file {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading batch file {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing batch file {}", path.display()))?
        }
        None => demo_batch(),
    };

    let store = Arc::new(MemoryStore::new());
    let garden = GardenId::random();

    // Every raised-bed block mentioned in the batch gets a bed entity, so
    // reconciliation has something to analyze.
    for block_id in raised_bed_blocks(&batch) {
        store.seed_bed(garden, RaisedBed::new(BedId::random(), block_id));
    }

    let service = GardenService::new(Arc::clone(&store));
    let report = service.mutate(garden, &batch).await?;

    match &report.outcome {
        BatchOutcome::Applied { operations } => {
            tracing::info!("Batch applied: {} operations", operations);
        }
        BatchOutcome::FailedAt { index, error } => {
            tracing::warn!("Batch failed at operation {}: {}", index, error);
        }
    }

    if let Some(reconcile) = &report.reconcile {
        let mut validity: Vec<_> = reconcile.validity.iter().collect();
        validity.sort_by_key(|(bed, _)| **bed);
        for (bed, valid) in validity {
            let bed_state = store.bed(*bed);
            tracing::info!(
                "bed {}: {}, orientation {:?}",
                bed,
                if *valid { "valid pair" } else { "invalid" },
                bed_state.map(|b| b.orientation),
            );
        }
        tracing::info!("{} orientation updates persisted", reconcile.updates.len());
    }

    Ok(())
}

/// Built-in scenario: a horizontal raised-bed pair at (0,0)/(1,0), plus a
/// lone bed at (5,5) that stays invalid.
fn demo_batch() -> Vec<RawOperation> {
    vec![
        RawOperation::add("/0/0", BlockRef::new("bed-block-1", RAISED_BED_KIND)),
        RawOperation::add("/1/0", BlockRef::new("bed-block-2", RAISED_BED_KIND)),
        RawOperation::add("/5/5", BlockRef::new("bed-block-3", RAISED_BED_KIND)),
        RawOperation::test("/0/0/0", BlockRef::bare("bed-block-1")),
    ]
}

/// Unique raised-bed block ids mentioned anywhere in a batch.
fn raised_bed_blocks(batch: &[RawOperation]) -> Vec<BlockId> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for op in batch {
        let Some(value) = &op.value else { continue };
        for block in value.clone().into_blocks() {
            if block.is_raised_bed() && seen.insert(block.id.clone()) {
                ids.push(block.id);
            }
        }
    }
    ids
}
