//! Kernel proving boundary
//!
//! The engine hands a [`TxTrace`] to a [`KernelProver`] and gets back the
//! kernel's public inputs and a proof. The real prover lives outside this
//! crate; [`MockKernelProver`] produces a deterministic commitment in
//! place of a proof so the rest of the pipeline can be exercised.

use crate::errors::{PxeError, Result};
use crate::field::Fr;
use crate::hashing::{compute_commitment, hash_struct, Backend};
use crate::input::{HistoricBlockData, TxContext, TxRequest};
use crate::output::{ExecutionResult, TxL2Logs};
use crate::squash::{PaddedArray, SquashedSideEffects};
use crate::types::Hash;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Everything the kernel circuit proves about one transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxTrace {
    pub request: TxRequest,
    pub execution: ExecutionResult,
    pub side_effects: SquashedSideEffects,
    pub encrypted_logs: TxL2Logs,
    pub unencrypted_logs: TxL2Logs,
    pub historic_block_data: HistoricBlockData,
}

/// Side effects accumulated over the whole call tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedAccumulatedData {
    pub new_commitments: PaddedArray<Fr>,
    pub new_nullifiers: PaddedArray<Fr>,
    /// Hashes of the enqueued public call requests
    pub public_call_stack: PaddedArray<Fr>,
    pub encrypted_logs_hash: Hash,
    pub unencrypted_logs_hash: Hash,
    pub encrypted_log_preimages_length: u64,
    pub unencrypted_log_preimages_length: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedConstantData {
    pub historic_block_data: HistoricBlockData,
    pub tx_context: TxContext,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelPublicInputs {
    pub end: CombinedAccumulatedData,
    pub constants: CombinedConstantData,
    pub is_private: bool,
}

impl KernelPublicInputs {
    /// Assemble the public inputs the kernel exposes for `trace`
    pub fn from_trace(trace: &TxTrace, backend: &Backend) -> Result<Self> {
        let calls = &trace.side_effects.public_call_stack;
        let mut public_call_stack = PaddedArray::new(calls.capacity());
        for call in calls.iter().flatten() {
            public_call_stack.push(call.hash(backend), "public calls")?;
        }
        Ok(Self {
            end: CombinedAccumulatedData {
                new_commitments: trace.side_effects.new_commitments.clone(),
                new_nullifiers: trace.side_effects.new_nullifiers.clone(),
                public_call_stack,
                encrypted_logs_hash: trace.encrypted_logs.hash(),
                unencrypted_logs_hash: trace.unencrypted_logs.hash(),
                encrypted_log_preimages_length: trace.encrypted_logs.byte_len() as u64,
                unencrypted_log_preimages_length: trace.unencrypted_logs.byte_len() as u64,
            },
            constants: CombinedConstantData {
                historic_block_data: trace.historic_block_data,
                tx_context: trace.request.tx_context,
            },
            is_private: true,
        })
    }

    /// Non-empty nullifiers, the first being the transaction nullifier
    pub fn nullifiers(&self) -> Vec<Fr> {
        self.end.new_nullifiers.iter().flatten().copied().collect()
    }

    pub fn hash(&self) -> Result<Hash> {
        hash_struct(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    pub bytes: Vec<u8>,
}

impl Proof {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// `0x`-prefixed hex encoding
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.bytes))
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim_start_matches("0x"))
            .map_err(|e| PxeError::SerializationError(e.to_string()))?;
        Ok(Self { bytes })
    }
}

#[async_trait]
pub trait KernelProver: Send + Sync {
    fn prover_id(&self) -> &'static str;

    async fn prove(&self, trace: &TxTrace) -> Result<(KernelPublicInputs, Proof)>;

    async fn verify(&self, public_inputs: &KernelPublicInputs, proof: &Proof) -> Result<bool>;
}

/// Deterministic stand-in for the kernel prover.
///
/// The proof is `request_hash || keccak(request_hash || public_inputs_hash)`.
/// Verification recomputes the commitment from the public inputs.
#[derive(Clone)]
pub struct MockKernelProver {
    backend: Backend,
}

impl MockKernelProver {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl KernelProver for MockKernelProver {
    fn prover_id(&self) -> &'static str {
        "mock"
    }

    async fn prove(&self, trace: &TxTrace) -> Result<(KernelPublicInputs, Proof)> {
        let public_inputs = KernelPublicInputs::from_trace(trace, &self.backend)?;
        let request_hash = hash_struct(&trace.request)?;
        let commitment = compute_commitment(&request_hash, &public_inputs.hash()?);

        let mut bytes = Vec::with_capacity(64);
        bytes.extend_from_slice(request_hash.as_slice());
        bytes.extend_from_slice(commitment.as_slice());
        debug!(prover = self.prover_id(), commitment = %hex::encode(commitment), "kernel proof generated");
        Ok((public_inputs, Proof::new(bytes)))
    }

    async fn verify(&self, public_inputs: &KernelPublicInputs, proof: &Proof) -> Result<bool> {
        if proof.len() != 64 {
            return Err(PxeError::Prover(format!(
                "expected a 64 byte proof, got {}",
                proof.len()
            )));
        }
        let request_hash = Hash::from_slice(&proof.bytes[..32]);
        let commitment = Hash::from_slice(&proof.bytes[32..]);
        Ok(compute_commitment(&request_hash, &public_inputs.hash()?) == commitment)
    }
}
