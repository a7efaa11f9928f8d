use super::address::Address;
use super::error::PatchError;
use super::op::{Operation, PatchValue, RawOperation};
use crate::grid::block::BlockRef;
use crate::grid::position::Coord;
use crate::grid::stack::Stack;
use crate::store::{GardenId, GridStore};

/// How a batch ended.
///
/// A tagged result rather than an error: on failure, operations
/// `0..index` are already committed and stay committed. Callers that need
/// all-or-nothing semantics lead the batch with `test` guards.
#[derive(Debug)]
pub enum BatchOutcome {
    Applied { operations: usize },
    FailedAt { index: usize, error: PatchError },
}

impl BatchOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, BatchOutcome::Applied { .. })
    }

    /// Number of operations that committed.
    pub fn applied_count(&self) -> usize {
        match self {
            BatchOutcome::Applied { operations } => *operations,
            BatchOutcome::FailedAt { index, .. } => *index,
        }
    }
}

/// Applies ordered patch batches against one garden's grid.
///
/// Operations run strictly in order — each store call is awaited before
/// the next operation starts, because later operations may depend on the
/// state earlier ones left behind. The engine halts at the first failure
/// and reports its index; there is no compensating rollback.
pub struct PatchEngine<'a, S: GridStore> {
    store: &'a S,
    garden: GardenId,
}

impl<'a, S: GridStore> PatchEngine<'a, S> {
    pub fn new(store: &'a S, garden: GardenId) -> Self {
        Self { store, garden }
    }

    pub async fn apply(&self, batch: &[RawOperation]) -> BatchOutcome {
        for (index, raw) in batch.iter().enumerate() {
            let result = match Operation::resolve(raw) {
                Ok(op) => self.apply_one(op).await,
                Err(error) => Err(error),
            };
            if let Err(error) = result {
                tracing::debug!("batch stopped at operation {}: {}", index, error);
                return BatchOutcome::FailedAt { index, error };
            }
        }
        BatchOutcome::Applied {
            operations: batch.len(),
        }
    }

    async fn apply_one(&self, op: Operation) -> Result<(), PatchError> {
        match op {
            Operation::Add { address, value } => self.add(address, value.into_blocks()).await,
            Operation::Remove { address } => self.remove(address).await,
            Operation::Replace { address, value } => self.replace(address, value).await,
            Operation::Move { address, from } => self.move_blocks(address, from).await,
            Operation::Copy { address, from } => self.copy_blocks(address, from).await,
            Operation::Test { address, value } => self.test(address, value).await,
        }
    }

    /// `add` creates the stack on demand. A stack address replaces the
    /// whole sequence, the append address extends it, an element address
    /// splices at the index (valid bounds `0..=len`; `index == len` is an
    /// append).
    async fn add(&self, address: Address, blocks: Vec<BlockRef>) -> Result<(), PatchError> {
        let coord = address.coord();
        let mut stack = match self.get_stack(coord).await? {
            Some(stack) => stack,
            None => {
                self.store
                    .create_stack(self.garden, coord)
                    .await
                    .map_err(PatchError::Store)?;
                Stack::new()
            }
        };

        match address {
            Address::Stack { .. } => stack.set_blocks(blocks),
            Address::Append { .. } => stack.append(blocks),
            Address::Element { index, .. } => {
                let len = stack.len();
                if !stack.insert(index, blocks) {
                    return Err(PatchError::IndexOutOfRange {
                        path: address.to_string(),
                        index,
                        len,
                    });
                }
            }
        }

        self.update_stack(coord, stack).await
    }

    async fn remove(&self, address: Address) -> Result<(), PatchError> {
        let coord = address.coord();
        match address {
            Address::Stack { .. } => {
                if self.get_stack(coord).await?.is_none() {
                    return Err(not_found(&address));
                }
                self.store
                    .delete_stack(self.garden, coord)
                    .await
                    .map_err(PatchError::Store)
            }
            Address::Element { index, .. } => {
                let mut stack = self
                    .get_stack(coord)
                    .await?
                    .ok_or_else(|| not_found(&address))?;
                if stack.remove(index).is_none() {
                    return Err(not_found(&address));
                }
                // Removing the last block leaves an empty stack in place;
                // only a whole-stack remove deletes the entry.
                self.update_stack(coord, stack).await
            }
            Address::Append { .. } => Err(not_found(&address)),
        }
    }

    /// `replace` never creates: the target stack (and element) must exist.
    async fn replace(&self, address: Address, value: PatchValue) -> Result<(), PatchError> {
        let coord = address.coord();
        match address {
            Address::Stack { .. } => {
                let PatchValue::Many(blocks) = value else {
                    return Err(malformed_replace("a whole-stack replace takes a list value"));
                };
                let mut stack = self
                    .get_stack(coord)
                    .await?
                    .ok_or_else(|| not_found(&address))?;
                stack.set_blocks(blocks);
                self.update_stack(coord, stack).await
            }
            Address::Element { index, .. } => {
                let PatchValue::One(block) = value else {
                    return Err(malformed_replace("an element replace takes a single value"));
                };
                let mut stack = self
                    .get_stack(coord)
                    .await?
                    .ok_or_else(|| not_found(&address))?;
                if stack.replace(index, block).is_none() {
                    return Err(not_found(&address));
                }
                self.update_stack(coord, stack).await
            }
            Address::Append { .. } => Err(not_found(&address)),
        }
    }

    /// Read at `from`, add at the destination, then remove at `from`.
    ///
    /// The add runs before the remove so a failed add cannot lose the
    /// blocks. A move onto its own source is an explicit no-op — the
    /// naive sequence would add over the source and then remove it.
    async fn move_blocks(&self, address: Address, from: Address) -> Result<(), PatchError> {
        if address == from {
            return Ok(());
        }
        let value = self.read(from).await?;
        self.add(address, value.into_blocks()).await?;
        self.remove(from).await
    }

    async fn copy_blocks(&self, address: Address, from: Address) -> Result<(), PatchError> {
        let value = self.read(from).await?;
        self.add(address, value.into_blocks()).await
    }

    /// Optimistic-concurrency guard: compare and never mutate.
    ///
    /// Both sides are normalized to block lists before comparing, so a
    /// single ref tests equal against a one-block stack.
    async fn test(&self, address: Address, value: PatchValue) -> Result<(), PatchError> {
        let current = self.read(address).await?;
        if current.into_blocks() != value.into_blocks() {
            return Err(PatchError::TestFailed {
                path: address.to_string(),
            });
        }
        Ok(())
    }

    /// Current value at an address: the whole sequence for a stack
    /// address, one block for an element address. The append address is
    /// an insertion target only — the block one past the top never exists.
    async fn read(&self, address: Address) -> Result<PatchValue, PatchError> {
        let stack = self
            .get_stack(address.coord())
            .await?
            .ok_or_else(|| not_found(&address))?;
        match address {
            Address::Stack { .. } => Ok(PatchValue::Many(stack.into_blocks())),
            Address::Element { index, .. } => stack
                .get(index)
                .cloned()
                .map(PatchValue::One)
                .ok_or_else(|| not_found(&address)),
            Address::Append { .. } => Err(not_found(&address)),
        }
    }

    async fn get_stack(&self, coord: Coord) -> Result<Option<Stack>, PatchError> {
        self.store
            .get_stack(self.garden, coord)
            .await
            .map_err(PatchError::Store)
    }

    async fn update_stack(&self, coord: Coord, stack: Stack) -> Result<(), PatchError> {
        self.store
            .update_stack(self.garden, coord, stack.into_blocks())
            .await
            .map_err(PatchError::Store)
    }
}

fn not_found(address: &Address) -> PatchError {
    PatchError::NotFound {
        path: address.to_string(),
    }
}

fn malformed_replace(message: &str) -> PatchError {
    PatchError::MalformedOperation {
        op: "replace".into(),
        message: message.into(),
    }
}
