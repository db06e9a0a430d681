//! Data oracle boundary
//!
//! The engine never owns notes, keys or trees. It asks a [`DataOracle`]
//! for them, and an [`AztecNode`] handle for live chain data that only
//! unconstrained functions may read. Both are read-only from the engine's
//! point of view and must tolerate concurrent readers, since independent
//! transactions are simulated against the same oracle.
//!
//! Lookups return `Option`/`Vec`; turning a miss into
//! [`PxeError::OracleLookupFailed`](crate::errors::PxeError) is the
//! engine's job so every caller gets the same error kind.

use crate::abi::FunctionAbi;
use crate::field::Fr;
use crate::types::{AztecAddress, EthAddress, FunctionSelector, PublicKey, SecretKey};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A committed note as stored by the oracle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteData {
    pub contract_address: AztecAddress,
    pub storage_slot: Fr,
    pub nonce: Fr,
    pub preimage: Vec<Fr>,
    pub siloed_nullifier: Fr,
    /// Leaf index in the private data tree
    pub index: u64,
}

/// Membership witness for a committed note hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitmentWitness {
    pub commitment: Fr,
    pub index: u64,
    pub sibling_path: Vec<Fr>,
}

/// An L1 to L2 message with its membership witness
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct L1ToL2MessageWitness {
    pub message: Vec<Fr>,
    pub index: u64,
    pub sibling_path: Vec<Fr>,
}

#[async_trait]
pub trait DataOracle: Send + Sync {
    /// ABI (bytecode included) of `selector` on `contract`
    async fn get_function_abi(
        &self,
        contract: AztecAddress,
        selector: FunctionSelector,
    ) -> Option<FunctionAbi>;

    async fn get_portal_contract_address(&self, contract: AztecAddress) -> Option<EthAddress>;

    /// Secret key matching `owner`, scoped to the requesting contract
    async fn get_secret_key(&self, contract: AztecAddress, owner: &PublicKey) -> Option<SecretKey>;

    /// Committed notes at (contract, slot), oldest first
    async fn get_notes(&self, contract: AztecAddress, storage_slot: Fr) -> Vec<NoteData>;

    /// Witness for a unique siloed note hash created by `contract`
    async fn get_commitment_witness(
        &self,
        contract: AztecAddress,
        note_hash: Fr,
    ) -> Option<CommitmentWitness>;

    async fn get_l1_to_l2_message(&self, msg_key: Fr) -> Option<L1ToL2MessageWitness>;
}

/// Handle to a rollup node
#[async_trait]
pub trait AztecNode: Send + Sync {
    async fn get_block_height(&self) -> u64;

    /// Unset storage reads as zero
    async fn get_public_storage_at(&self, contract: AztecAddress, slot: Fr) -> Fr;
}

pub type SharedOracle = Arc<dyn DataOracle>;
pub type SharedNode = Arc<dyn AztecNode>;
