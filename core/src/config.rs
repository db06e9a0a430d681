//! Simulator configuration
//!
//! Protocol limits the engine enforces while building a transaction. The
//! array sizes mirror the fixed-length arrays of the kernel circuit, so
//! changing them only makes sense together with the circuit.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Maximum nesting depth of private calls (entry point is depth 0)
    pub max_call_depth: usize,
    /// Instructions a single function may execute before it is aborted
    pub max_steps_per_call: usize,
    /// Length of the kernel's new-commitments array
    pub max_new_commitments_per_tx: usize,
    /// Length of the kernel's new-nullifiers array (includes the tx nullifier)
    pub max_new_nullifiers_per_tx: usize,
    /// Length of the kernel's public call stack
    pub max_public_call_stack_per_tx: usize,
    /// Upper bound on notes a single get-notes instruction may return
    pub max_notes_per_get: usize,
    /// Upper bound on length operands in bytecode: note preimage, message
    /// and sibling path lengths, and nested call return lengths
    pub max_operand_len: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            max_call_depth: 16,
            max_steps_per_call: 1_000_000,
            max_new_commitments_per_tx: 64,
            max_new_nullifiers_per_tx: 64,
            max_public_call_stack_per_tx: 8,
            max_notes_per_get: 10,
            max_operand_len: 256,
        }
    }
}

impl SimulatorConfig {
    /// Set the maximum call depth
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Set the per-function step limit
    pub fn with_max_steps_per_call(mut self, steps: usize) -> Self {
        self.max_steps_per_call = steps;
        self
    }

    /// Set the kernel side-effect array sizes
    pub fn with_side_effect_limits(mut self, commitments: usize, nullifiers: usize) -> Self {
        self.max_new_commitments_per_tx = commitments;
        self.max_new_nullifiers_per_tx = nullifiers;
        self
    }

    /// Set the cap on bytecode length operands
    pub fn with_max_operand_len(mut self, len: usize) -> Self {
        self.max_operand_len = len;
        self
    }

    /// Set the public call stack size
    pub fn with_max_public_call_stack(mut self, len: usize) -> Self {
        self.max_public_call_stack_per_tx = len;
        self
    }
}
