//! Squashing of transient notes
//!
//! After the call tree has run, a commitment that is nullified later in
//! the same transaction never reaches the chain: both entries become
//! empty at their original positions. Nothing is compacted, so surviving
//! entries keep their positions in the fixed-size arrays the kernel
//! circuit expects. A nullifier whose note was committed in an earlier
//! transaction has no in-transaction commitment to match and survives.

use crate::config::SimulatorConfig;
use crate::errors::{PxeError, Result};
use crate::field::Fr;
use crate::output::{collect_enqueued_public_function_calls, ExecutionResult, PublicCallRequest};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fixed-capacity array with an explicit empty marker.
///
/// Slots past the last push are empty, and so is any slot that was
/// cleared. Clearing never shifts later entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaddedArray<T> {
    items: Vec<Option<T>>,
    len: usize,
}

impl<T> PaddedArray<T> {
    /// Array with `capacity` empty slots
    pub fn new(capacity: usize) -> Self {
        let mut items = Vec::with_capacity(capacity);
        items.resize_with(capacity, || None);
        Self { items, len: 0 }
    }

    /// Append at the next unused position; `kind` names the array in
    /// the overflow error
    pub fn push(&mut self, item: T, kind: &'static str) -> Result<()> {
        let capacity = self.capacity();
        let slot = self.items.get_mut(self.len).ok_or(PxeError::TooManySideEffects {
            kind,
            limit: capacity,
        })?;
        *slot = Some(item);
        self.len += 1;
        Ok(())
    }

    /// Empty the slot at `index`, returning what was there
    pub fn clear(&mut self, index: usize) -> Option<T> {
        self.items.get_mut(index).and_then(Option::take)
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index).and_then(Option::as_ref)
    }

    pub fn capacity(&self) -> usize {
        self.items.len()
    }

    /// Number of positions ever pushed, cleared ones included
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots currently holding a value
    pub fn non_empty_len(&self) -> usize {
        self.items.iter().filter(|item| item.is_some()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&T>> {
        self.items.iter().map(Option::as_ref)
    }

    pub fn as_slice(&self) -> &[Option<T>] {
        &self.items
    }
}

impl PaddedArray<Fr> {
    /// Field view with empty slots as zero
    pub fn to_fields(&self) -> Vec<Fr> {
        self.items
            .iter()
            .map(|item| item.unwrap_or(Fr::ZERO))
            .collect()
    }
}

/// Side effects of a transaction after squashing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SquashedSideEffects {
    pub new_commitments: PaddedArray<Fr>,
    /// Slot 0 holds the transaction nullifier
    pub new_nullifiers: PaddedArray<Fr>,
    pub public_call_stack: PaddedArray<PublicCallRequest>,
}

/// Flatten a call tree into kernel-sized arrays, clearing every
/// commitment that is nullified within the same transaction together
/// with the nullifier that spent it.
///
/// # Arguments
/// * `result` - Root of the simulated call tree
/// * `tx_nullifier` - Placed at nullifier slot 0
/// * `config` - Array capacities
///
/// # Returns
/// The squashed side effects, or `TooManySideEffects` when an array
/// would overflow
pub fn squash(
    result: &ExecutionResult,
    tx_nullifier: Fr,
    config: &SimulatorConfig,
) -> Result<SquashedSideEffects> {
    let commitments = result.all_commitments();
    let nullifiers = result.all_nullifiers();

    let mut new_commitments = PaddedArray::new(config.max_new_commitments_per_tx);
    for commitment in &commitments {
        new_commitments.push(commitment.value, "commitments")?;
    }
    let mut new_nullifiers = PaddedArray::new(config.max_new_nullifiers_per_tx);
    new_nullifiers.push(tx_nullifier, "nullifiers")?;
    for nullifier in &nullifiers {
        new_nullifiers.push(nullifier.value, "nullifiers")?;
    }

    let mut squashed = 0usize;
    for (i, nullifier) in nullifiers.iter().enumerate() {
        let Some(target) = nullifier.nullified_commitment else {
            continue;
        };
        // the commitment must come first and must not be squashed already
        let matched = commitments.iter().enumerate().position(|(j, c)| {
            c.value == target && c.counter < nullifier.counter && new_commitments.get(j).is_some()
        });
        if let Some(j) = matched {
            new_commitments.clear(j);
            new_nullifiers.clear(i + 1);
            squashed += 1;
        }
    }

    let mut public_call_stack = PaddedArray::new(config.max_public_call_stack_per_tx);
    for call in collect_enqueued_public_function_calls(result) {
        public_call_stack.push(call, "public calls")?;
    }

    debug!(
        commitments = new_commitments.non_empty_len(),
        nullifiers = new_nullifiers.non_empty_len(),
        squashed,
        "squashed transient notes"
    );
    Ok(SquashedSideEffects {
        new_commitments,
        new_nullifiers,
        public_call_stack,
    })
}
