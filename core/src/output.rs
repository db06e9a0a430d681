//! Execution results
//!
//! One [`ExecutionResult`] per (possibly nested) private function
//! invocation. A parent owns its nested results in call order, so the
//! whole transaction is a tree rooted at the entrypoint.
//!
//! Every side effect carries a transaction-wide counter. Counters are
//! handed out in execution order across all frames, which is what makes
//! "created earlier in this transaction" well defined for squashing.

use crate::abi::FunctionData;
use crate::errors::Result;
use crate::field::Fr;
use crate::hashing::{hash_struct, keccak256, Backend, GeneratorIndex};
use crate::input::CallContext;
use crate::types::{AztecAddress, Hash};
use serde::{Deserialize, Serialize};

/// A note commitment created during execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCommitment {
    pub contract_address: AztecAddress,
    pub storage_slot: Fr,
    pub nonce: Fr,
    pub inner_note_hash: Fr,
    /// Unique siloed note hash, the value published on chain
    pub value: Fr,
    pub counter: u32,
}

/// A nullifier emitted during execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNullifier {
    pub value: Fr,
    /// Unique siloed hash of the note this nullifier spends, if any
    pub nullified_commitment: Option<Fr>,
    pub counter: u32,
}

/// A read of a committed (or pending) note hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadRequest {
    pub note_hash: Fr,
    pub index: u64,
    pub is_transient: bool,
}

/// A public function call enqueued by a private function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicCallRequest {
    pub contract_address: AztecAddress,
    pub function_data: FunctionData,
    pub call_context: CallContext,
    pub args: Vec<Fr>,
    pub counter: u32,
}

impl PublicCallRequest {
    /// Hash pushed onto the kernel's public call stack
    pub fn hash(&self, backend: &Backend) -> Fr {
        let mut inputs = vec![
            self.contract_address.to_field(),
            self.function_data.hash(backend),
            self.call_context.hash(backend),
            Fr::from(u64::from(self.counter)),
        ];
        inputs.extend_from_slice(&self.args);
        backend.hash(GeneratorIndex::PublicCallRequest, &inputs)
    }
}

/// Logs emitted by a single function invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionL2Logs {
    pub logs: Vec<Vec<u8>>,
}

impl FunctionL2Logs {
    pub fn push_fields(&mut self, fields: &[Fr]) {
        let mut bytes = Vec::with_capacity(fields.len() * 32);
        for field in fields {
            bytes.extend_from_slice(&field.to_be_bytes());
        }
        self.logs.push(bytes);
    }

    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }

    /// Total payload length in bytes
    pub fn byte_len(&self) -> usize {
        self.logs.iter().map(Vec::len).sum()
    }

    pub fn hash(&self) -> Hash {
        keccak256(&self.logs.concat())
    }
}

/// Logs of a whole transaction, one entry per private invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxL2Logs {
    pub function_logs: Vec<FunctionL2Logs>,
}

impl TxL2Logs {
    pub fn new(function_logs: Vec<FunctionL2Logs>) -> Self {
        Self { function_logs }
    }

    /// Number of per-function entries
    pub fn function_count(&self) -> usize {
        self.function_logs.len()
    }

    /// Number of individual logs across all functions
    pub fn log_count(&self) -> usize {
        self.function_logs.iter().map(FunctionL2Logs::len).sum()
    }

    pub fn byte_len(&self) -> usize {
        self.function_logs.iter().map(FunctionL2Logs::byte_len).sum()
    }

    /// Hash chaining each function's log hash
    pub fn hash(&self) -> Hash {
        self.function_logs
            .iter()
            .fold(Hash::ZERO, |acc, logs| {
                crate::hashing::hash_concat(&[acc.as_slice(), logs.hash().as_slice()])
            })
    }
}

/// Result of simulating one private function invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub function_name: String,
    pub contract_address: AztecAddress,
    pub function_data: FunctionData,
    pub call_context: CallContext,
    pub args: Vec<Fr>,
    pub return_values: Vec<Fr>,
    pub new_commitments: Vec<NewCommitment>,
    pub new_nullifiers: Vec<NewNullifier>,
    pub read_requests: Vec<ReadRequest>,
    pub enqueued_public_calls: Vec<PublicCallRequest>,
    pub encrypted_logs: FunctionL2Logs,
    pub unencrypted_logs: FunctionL2Logs,
    /// Results of inner private calls, in call order
    pub nested: Vec<ExecutionResult>,
}

impl ExecutionResult {
    /// Deterministic hash of the whole result tree
    pub fn hash(&self) -> Result<Hash> {
        hash_struct(self)
    }

    /// This frame followed by all nested frames, depth first
    pub fn frames(&self) -> Vec<&ExecutionResult> {
        let mut out = vec![self];
        for nested in &self.nested {
            out.extend(nested.frames());
        }
        out
    }

    /// Every commitment in the tree, ordered by side-effect counter
    pub fn all_commitments(&self) -> Vec<&NewCommitment> {
        let mut all: Vec<_> = self
            .frames()
            .into_iter()
            .flat_map(|f| f.new_commitments.iter())
            .collect();
        all.sort_by_key(|c| c.counter);
        all
    }

    /// Every nullifier in the tree, ordered by side-effect counter
    pub fn all_nullifiers(&self) -> Vec<&NewNullifier> {
        let mut all: Vec<_> = self
            .frames()
            .into_iter()
            .flat_map(|f| f.new_nullifiers.iter())
            .collect();
        all.sort_by_key(|n| n.counter);
        all
    }

    /// Total number of invocations in the tree
    pub fn call_count(&self) -> usize {
        1 + self.nested.iter().map(ExecutionResult::call_count).sum::<usize>()
    }
}

/// Encrypted logs of every invocation, in pre-order
pub fn collect_encrypted_logs(result: &ExecutionResult) -> TxL2Logs {
    TxL2Logs::new(
        result
            .frames()
            .into_iter()
            .map(|f| f.encrypted_logs.clone())
            .collect(),
    )
}

/// Unencrypted logs of every invocation, in pre-order
pub fn collect_unencrypted_logs(result: &ExecutionResult) -> TxL2Logs {
    TxL2Logs::new(
        result
            .frames()
            .into_iter()
            .map(|f| f.unencrypted_logs.clone())
            .collect(),
    )
}

/// Enqueued public calls of the whole tree, in the order they were made
pub fn collect_enqueued_public_function_calls(result: &ExecutionResult) -> Vec<PublicCallRequest> {
    let mut calls: Vec<PublicCallRequest> = result
        .frames()
        .into_iter()
        .flat_map(|f| f.enqueued_public_calls.iter().cloned())
        .collect();
    calls.sort_by_key(|c| c.counter);
    calls
}
