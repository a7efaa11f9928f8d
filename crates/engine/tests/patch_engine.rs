//! Patch-engine tests against a plain in-memory store. These exercise the
//! protocol semantics only — the reference concurrent store lives in the
//! server crate.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use garden_engine::grid::Grid;
use garden_engine::grid::block::BlockRef;
use garden_engine::grid::position::Coord;
use garden_engine::grid::stack::Stack;
use garden_engine::patch::{BatchOutcome, PatchEngine, PatchError, RawOperation};
use garden_engine::store::{BoxError, GardenId, GridStore};

// ---------------------------------------------------------------------------
// Test store
// ---------------------------------------------------------------------------

/// Single-garden test double: a mutex-guarded map, no real I/O.
#[derive(Default)]
struct TestStore {
    stacks: Mutex<HashMap<Coord, Stack>>,
}

#[async_trait]
impl GridStore for TestStore {
    async fn get_stack(&self, _garden: GardenId, coord: Coord) -> Result<Option<Stack>, BoxError> {
        Ok(self.stacks.lock().unwrap().get(&coord).cloned())
    }

    async fn create_stack(&self, _garden: GardenId, coord: Coord) -> Result<(), BoxError> {
        self.stacks.lock().unwrap().insert(coord, Stack::new());
        Ok(())
    }

    async fn update_stack(
        &self,
        _garden: GardenId,
        coord: Coord,
        blocks: Vec<BlockRef>,
    ) -> Result<(), BoxError> {
        self.stacks
            .lock()
            .unwrap()
            .insert(coord, Stack::from_blocks(blocks));
        Ok(())
    }

    async fn delete_stack(&self, _garden: GardenId, coord: Coord) -> Result<(), BoxError> {
        self.stacks.lock().unwrap().remove(&coord);
        Ok(())
    }

    async fn load_grid(&self, _garden: GardenId) -> Result<Grid, BoxError> {
        let mut grid = Grid::new();
        for (coord, stack) in self.stacks.lock().unwrap().iter() {
            grid.insert_stack(*coord, stack.clone());
        }
        Ok(grid)
    }
}

impl TestStore {
    fn seed(&self, coord: Coord, ids: &[&str]) {
        self.stacks.lock().unwrap().insert(
            coord,
            Stack::from_blocks(ids.iter().map(|id| BlockRef::bare(*id)).collect()),
        );
    }

    fn ids_at(&self, coord: Coord) -> Option<Vec<String>> {
        self.stacks.lock().unwrap().get(&coord).map(|stack| {
            stack
                .blocks()
                .iter()
                .map(|b| b.id.as_str().to_string())
                .collect()
        })
    }
}

fn block(id: &str) -> BlockRef {
    BlockRef::bare(id)
}

fn blocks(ids: &[&str]) -> Vec<BlockRef> {
    ids.iter().map(|id| BlockRef::bare(*id)).collect()
}

async fn apply(store: &TestStore, batch: &[RawOperation]) -> BatchOutcome {
    PatchEngine::new(store, GardenId::random()).apply(batch).await
}

fn assert_failed_at(outcome: &BatchOutcome, at: usize, check: impl Fn(&PatchError) -> bool) {
    match outcome {
        BatchOutcome::FailedAt { index, error } => {
            assert_eq!(*index, at, "failed at wrong index: {error}");
            assert!(check(error), "unexpected error kind: {error}");
        }
        BatchOutcome::Applied { .. } => panic!("batch unexpectedly applied"),
    }
}

// ---------------------------------------------------------------------------
// add
// ---------------------------------------------------------------------------

#[tokio::test]
async fn add_creates_the_stack_on_demand() {
    let store = TestStore::default();
    let outcome = apply(&store, &[RawOperation::add("/2/3", block("a"))]).await;
    assert!(outcome.is_applied());
    // A single ref is wrapped as a one-element sequence.
    assert_eq!(store.ids_at(Coord::new(2, 3)).unwrap(), ["a"]);
}

#[tokio::test]
async fn add_at_stack_address_replaces_the_sequence() {
    let store = TestStore::default();
    store.seed(Coord::new(0, 0), &["old1", "old2"]);
    let outcome = apply(&store, &[RawOperation::add("/0/0", blocks(&["a", "b"]))]).await;
    assert!(outcome.is_applied());
    assert_eq!(store.ids_at(Coord::new(0, 0)).unwrap(), ["a", "b"]);
}

#[tokio::test]
async fn add_at_append_address_extends_the_sequence() {
    let store = TestStore::default();
    store.seed(Coord::new(0, 0), &["a"]);
    let outcome = apply(
        &store,
        &[RawOperation::add("/0/0/-", blocks(&["b", "c"]))],
    )
    .await;
    assert!(outcome.is_applied());
    assert_eq!(store.ids_at(Coord::new(0, 0)).unwrap(), ["a", "b", "c"]);
}

#[tokio::test]
async fn add_at_element_address_splices() {
    let store = TestStore::default();
    store.seed(Coord::new(0, 0), &["a", "c"]);
    let outcome = apply(&store, &[RawOperation::add("/0/0/1", block("b"))]).await;
    assert!(outcome.is_applied());
    assert_eq!(store.ids_at(Coord::new(0, 0)).unwrap(), ["a", "b", "c"]);
}

#[tokio::test]
async fn add_at_index_equal_to_len_appends() {
    let store = TestStore::default();
    store.seed(Coord::new(0, 0), &["a"]);
    let outcome = apply(&store, &[RawOperation::add("/0/0/1", block("b"))]).await;
    assert!(outcome.is_applied());
    assert_eq!(store.ids_at(Coord::new(0, 0)).unwrap(), ["a", "b"]);
}

#[tokio::test]
async fn add_past_the_end_is_out_of_range() {
    let store = TestStore::default();
    store.seed(Coord::new(0, 0), &["a"]);
    let outcome = apply(&store, &[RawOperation::add("/0/0/2", block("b"))]).await;
    assert_failed_at(&outcome, 0, |e| {
        matches!(e, PatchError::IndexOutOfRange { index: 2, len: 1, .. })
    });
    // Untouched.
    assert_eq!(store.ids_at(Coord::new(0, 0)).unwrap(), ["a"]);
}

// ---------------------------------------------------------------------------
// remove
// ---------------------------------------------------------------------------

#[tokio::test]
async fn remove_element_shifts_the_rest_down() {
    let store = TestStore::default();
    store.seed(Coord::new(0, 0), &["a", "b", "c"]);
    let outcome = apply(&store, &[RawOperation::remove("/0/0/1")]).await;
    assert!(outcome.is_applied());
    assert_eq!(store.ids_at(Coord::new(0, 0)).unwrap(), ["a", "c"]);
}

#[tokio::test]
async fn remove_last_element_leaves_an_empty_stack() {
    let store = TestStore::default();
    store.seed(Coord::new(0, 0), &["a"]);
    let outcome = apply(&store, &[RawOperation::remove("/0/0/0")]).await;
    assert!(outcome.is_applied());
    // Present but empty: element removal never deletes the stack itself.
    assert_eq!(store.ids_at(Coord::new(0, 0)).unwrap(), Vec::<String>::new());
}

#[tokio::test]
async fn remove_stack_address_deletes_the_stack() {
    let store = TestStore::default();
    store.seed(Coord::new(0, 0), &["a", "b"]);
    let outcome = apply(&store, &[RawOperation::remove("/0/0")]).await;
    assert!(outcome.is_applied());
    assert!(store.ids_at(Coord::new(0, 0)).is_none());
}

#[tokio::test]
async fn remove_on_empty_stack_is_not_found() {
    let store = TestStore::default();
    store.seed(Coord::new(0, 0), &[]);
    let outcome = apply(&store, &[RawOperation::remove("/0/0/5")]).await;
    assert_failed_at(&outcome, 0, |e| matches!(e, PatchError::NotFound { .. }));
}

#[tokio::test]
async fn remove_missing_stack_is_not_found() {
    let store = TestStore::default();
    let outcome = apply(&store, &[RawOperation::remove("/9/9")]).await;
    assert_failed_at(&outcome, 0, |e| matches!(e, PatchError::NotFound { .. }));
}

// ---------------------------------------------------------------------------
// replace
// ---------------------------------------------------------------------------

#[tokio::test]
async fn replace_stack_takes_a_list() {
    let store = TestStore::default();
    store.seed(Coord::new(0, 0), &["a"]);
    let outcome = apply(
        &store,
        &[RawOperation::replace("/0/0", blocks(&["x", "y"]))],
    )
    .await;
    assert!(outcome.is_applied());
    assert_eq!(store.ids_at(Coord::new(0, 0)).unwrap(), ["x", "y"]);

    let outcome = apply(&store, &[RawOperation::replace("/0/0", block("z"))]).await;
    assert_failed_at(&outcome, 0, |e| {
        matches!(e, PatchError::MalformedOperation { .. })
    });
}

#[tokio::test]
async fn replace_element_overwrites_in_place() {
    let store = TestStore::default();
    store.seed(Coord::new(0, 0), &["a", "b"]);
    let outcome = apply(&store, &[RawOperation::replace("/0/0/1", block("z"))]).await;
    assert!(outcome.is_applied());
    assert_eq!(store.ids_at(Coord::new(0, 0)).unwrap(), ["a", "z"]);
}

#[tokio::test]
async fn replace_never_creates() {
    let store = TestStore::default();
    let outcome = apply(&store, &[RawOperation::replace("/5/5", blocks(&["a"]))]).await;
    assert_failed_at(&outcome, 0, |e| matches!(e, PatchError::NotFound { .. }));
}

// ---------------------------------------------------------------------------
// move / copy
// ---------------------------------------------------------------------------

#[tokio::test]
async fn move_transfers_the_whole_stack() {
    let store = TestStore::default();
    store.seed(Coord::new(0, 0), &["a", "b"]);
    let outcome = apply(&store, &[RawOperation::move_from("/1/0", "/0/0")]).await;
    assert!(outcome.is_applied());
    assert!(store.ids_at(Coord::new(0, 0)).is_none());
    assert_eq!(store.ids_at(Coord::new(1, 0)).unwrap(), ["a", "b"]);
}

#[tokio::test]
async fn move_onto_itself_keeps_the_blocks() {
    let store = TestStore::default();
    store.seed(Coord::new(0, 0), &["a", "b"]);
    let outcome = apply(&store, &[RawOperation::move_from("/0/0", "/0/0")]).await;
    assert!(outcome.is_applied());
    assert_eq!(store.ids_at(Coord::new(0, 0)).unwrap(), ["a", "b"]);
}

#[tokio::test]
async fn move_of_a_single_element() {
    let store = TestStore::default();
    store.seed(Coord::new(0, 0), &["a", "b"]);
    let outcome = apply(&store, &[RawOperation::move_from("/1/0/-", "/0/0/1")]).await;
    assert!(outcome.is_applied());
    assert_eq!(store.ids_at(Coord::new(0, 0)).unwrap(), ["a"]);
    assert_eq!(store.ids_at(Coord::new(1, 0)).unwrap(), ["b"]);
}

#[tokio::test]
async fn failed_move_does_not_remove_the_source() {
    let store = TestStore::default();
    store.seed(Coord::new(0, 0), &["a"]);
    store.seed(Coord::new(1, 0), &["x"]);
    // Destination index is past the end of the target stack: add fails,
    // so the remove must not run.
    let outcome = apply(&store, &[RawOperation::move_from("/1/0/5", "/0/0/0")]).await;
    assert_failed_at(&outcome, 0, |e| {
        matches!(e, PatchError::IndexOutOfRange { .. })
    });
    assert_eq!(store.ids_at(Coord::new(0, 0)).unwrap(), ["a"]);
    assert_eq!(store.ids_at(Coord::new(1, 0)).unwrap(), ["x"]);
}

#[tokio::test]
async fn copy_leaves_the_source_untouched() {
    let store = TestStore::default();
    store.seed(Coord::new(0, 0), &["a", "b"]);
    let outcome = apply(&store, &[RawOperation::copy_from("/1/0", "/0/0")]).await;
    assert!(outcome.is_applied());
    assert_eq!(store.ids_at(Coord::new(0, 0)).unwrap(), ["a", "b"]);
    assert_eq!(store.ids_at(Coord::new(1, 0)).unwrap(), ["a", "b"]);
}

// ---------------------------------------------------------------------------
// test
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_passes_and_never_mutates() {
    let store = TestStore::default();
    store.seed(Coord::new(0, 0), &["a", "b"]);

    let outcome = apply(&store, &[RawOperation::test("/0/0", blocks(&["a", "b"]))]).await;
    assert!(outcome.is_applied());
    assert_eq!(store.ids_at(Coord::new(0, 0)).unwrap(), ["a", "b"]);

    let outcome = apply(&store, &[RawOperation::test("/0/0/0", block("z"))]).await;
    assert_failed_at(&outcome, 0, |e| matches!(e, PatchError::TestFailed { .. }));
    assert_eq!(store.ids_at(Coord::new(0, 0)).unwrap(), ["a", "b"]);
}

#[tokio::test]
async fn test_reading_through_append_is_not_found() {
    let store = TestStore::default();
    store.seed(Coord::new(0, 0), &["a"]);
    let outcome = apply(&store, &[RawOperation::test("/0/0/-", block("a"))]).await;
    assert_failed_at(&outcome, 0, |e| matches!(e, PatchError::NotFound { .. }));
}

// ---------------------------------------------------------------------------
// Batch behavior
// ---------------------------------------------------------------------------

#[tokio::test]
async fn append_then_test_scenario() {
    let store = TestStore::default();
    let outcome = apply(
        &store,
        &[
            RawOperation::add("/0/0/-", block("blockA")),
            RawOperation::test("/0/0/0", block("blockA")),
        ],
    )
    .await;
    assert!(outcome.is_applied());
    assert_eq!(outcome.applied_count(), 2);
}

#[tokio::test]
async fn add_then_remove_round_trips() {
    let store = TestStore::default();
    store.seed(Coord::new(0, 0), &["a", "c"]);
    let outcome = apply(
        &store,
        &[
            RawOperation::add("/0/0/1", block("b")),
            RawOperation::remove("/0/0/1"),
        ],
    )
    .await;
    assert!(outcome.is_applied());
    assert_eq!(store.ids_at(Coord::new(0, 0)).unwrap(), ["a", "c"]);
}

#[tokio::test]
async fn batch_halts_at_first_failure_without_rollback() {
    let store = TestStore::default();
    let outcome = apply(
        &store,
        &[
            RawOperation::add("/0/0", block("a")),
            RawOperation::remove("/9/9"),
            RawOperation::add("/0/0/-", block("never")),
        ],
    )
    .await;
    assert_failed_at(&outcome, 1, |e| matches!(e, PatchError::NotFound { .. }));
    assert_eq!(outcome.applied_count(), 1);
    // The first operation stays committed.
    assert_eq!(store.ids_at(Coord::new(0, 0)).unwrap(), ["a"]);
}

#[tokio::test]
async fn leading_test_guard_protects_the_batch() {
    let store = TestStore::default();
    store.seed(Coord::new(0, 0), &["stale"]);
    let outcome = apply(
        &store,
        &[
            RawOperation::test("/0/0", blocks(&["expected"])),
            RawOperation::remove("/0/0"),
        ],
    )
    .await;
    assert_failed_at(&outcome, 0, |e| matches!(e, PatchError::TestFailed { .. }));
    // Nothing mutated.
    assert_eq!(store.ids_at(Coord::new(0, 0)).unwrap(), ["stale"]);
}

#[tokio::test]
async fn unknown_op_reports_not_implemented() {
    let store = TestStore::default();
    let raw = RawOperation {
        op: "merge".into(),
        path: "/0/0".into(),
        value: None,
        from: None,
    };
    let outcome = apply(&store, &[raw]).await;
    assert_failed_at(&outcome, 0, |e| {
        matches!(e, PatchError::NotImplemented { .. })
    });
}

#[tokio::test]
async fn invalid_path_reports_invalid_address() {
    let store = TestStore::default();
    let outcome = apply(&store, &[RawOperation::remove("/only-one")]).await;
    assert_failed_at(&outcome, 0, |e| {
        matches!(e, PatchError::InvalidAddress { .. })
    });
}

#[tokio::test]
async fn empty_batch_applies_trivially() {
    let store = TestStore::default();
    let outcome = apply(&store, &[]).await;
    assert!(outcome.is_applied());
    assert_eq!(outcome.applied_count(), 0);
}
