//! Per-transaction execution context
//!
//! Shared by every frame of one transaction's call tree. It owns the
//! packed-args cache and the ledger of notes created so far, and wraps
//! the data oracle so a missing entry always surfaces as
//! [`PxeError::OracleLookupFailed`].
//!
//! The ledger is append-only: nothing created during execution is
//! removed until squashing runs over the finished result tree.

use crate::abi::FunctionAbi;
use crate::config::SimulatorConfig;
use crate::errors::{OracleLookup, PxeError, Result};
use crate::field::Fr;
use crate::hashing::Backend;
use crate::input::{HistoricBlockData, TxContext};
use crate::note_hash::{
    compute_inner_note_hash, compute_note_nonce, compute_siloed_note_hash,
    compute_unique_siloed_note_hash,
};
use crate::oracle::{CommitmentWitness, L1ToL2MessageWitness, SharedOracle};
use crate::packed_args::PackedArgsCache;
use crate::types::{AztecAddress, EthAddress, FunctionSelector, PublicKey, SecretKey};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// A note created earlier in the current transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingNote {
    pub contract_address: AztecAddress,
    pub storage_slot: Fr,
    /// Position among the notes created at this (contract, slot)
    pub counter: u64,
    pub nonce: Fr,
    pub preimage: Vec<Fr>,
    pub inner_note_hash: Fr,
    pub siloed_note_hash: Fr,
    pub unique_siloed_note_hash: Fr,
}

/// A note as seen by a running function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteView {
    pub nonce: Fr,
    pub preimage: Vec<Fr>,
    /// Created in this transaction and not yet committed
    pub is_transient: bool,
    /// Leaf index for committed notes
    pub index: Option<u64>,
}

pub struct ExecutionContext {
    oracle: SharedOracle,
    backend: Backend,
    config: SimulatorConfig,
    tx_nullifier: Fr,
    tx_context: TxContext,
    historic_block_data: Arc<HistoricBlockData>,
    packed_args: PackedArgsCache,
    pending_notes: BTreeMap<(AztecAddress, Fr), Vec<PendingNote>>,
    side_effect_counter: u32,
}

impl ExecutionContext {
    pub fn new(
        oracle: SharedOracle,
        backend: Backend,
        tx_nullifier: Fr,
        tx_context: TxContext,
        historic_block_data: Arc<HistoricBlockData>,
        packed_args: PackedArgsCache,
    ) -> Self {
        Self {
            oracle,
            backend,
            config: SimulatorConfig::default(),
            tx_nullifier,
            tx_context,
            historic_block_data,
            packed_args,
            pending_notes: BTreeMap::new(),
            side_effect_counter: 0,
        }
    }

    pub fn with_config(mut self, config: SimulatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Transaction nullifier seed
    pub fn tx_nullifier(&self) -> Fr {
        self.tx_nullifier
    }

    pub fn tx_context(&self) -> &TxContext {
        &self.tx_context
    }

    pub fn historic_block_data(&self) -> &HistoricBlockData {
        &self.historic_block_data
    }

    /// Arguments behind `hash`; unknown hashes fail with `ArgsNotFound`
    pub fn unpack_args(&self, hash: Fr) -> Result<Vec<Fr>> {
        self.packed_args.unpack(hash)
    }

    pub fn pack_args(&mut self, args: Vec<Fr>) -> Fr {
        self.packed_args.pack(args)
    }

    /// Take the next transaction-wide side-effect counter
    pub fn next_side_effect_counter(&mut self) -> u32 {
        let counter = self.side_effect_counter;
        self.side_effect_counter += 1;
        counter
    }

    /// Record a new note and derive its nonce and hashes
    pub fn insert_note(
        &mut self,
        contract_address: AztecAddress,
        storage_slot: Fr,
        preimage: Vec<Fr>,
    ) -> PendingNote {
        let notes = self
            .pending_notes
            .entry((contract_address, storage_slot))
            .or_default();
        let counter = notes.len() as u64;
        let nonce = compute_note_nonce(
            &self.backend,
            self.tx_nullifier,
            contract_address,
            storage_slot,
            counter,
        );
        let inner_note_hash = compute_inner_note_hash(&self.backend, storage_slot, &preimage);
        let siloed_note_hash =
            compute_siloed_note_hash(&self.backend, contract_address, inner_note_hash);
        let unique_siloed_note_hash =
            compute_unique_siloed_note_hash(&self.backend, nonce, siloed_note_hash);
        let note = PendingNote {
            contract_address,
            storage_slot,
            counter,
            nonce,
            preimage,
            inner_note_hash,
            siloed_note_hash,
            unique_siloed_note_hash,
        };
        debug!(contract = %contract_address, slot = %storage_slot, counter, "inserting pending note");
        notes.push(note.clone());
        note
    }

    /// Notes created in this transaction at (contract, slot), oldest first
    pub fn pending_notes(&self, contract_address: AztecAddress, storage_slot: Fr) -> &[PendingNote] {
        self.pending_notes
            .get(&(contract_address, storage_slot))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Pending notes followed by committed notes. Both are always
    /// returned; filtering is up to the contract.
    pub async fn get_notes(
        &self,
        contract_address: AztecAddress,
        storage_slot: Fr,
    ) -> Vec<NoteView> {
        let mut notes: Vec<NoteView> = self
            .pending_notes(contract_address, storage_slot)
            .iter()
            .map(|note| NoteView {
                nonce: note.nonce,
                preimage: note.preimage.clone(),
                is_transient: true,
                index: None,
            })
            .collect();
        let committed = self.oracle.get_notes(contract_address, storage_slot).await;
        notes.extend(committed.into_iter().map(|note| NoteView {
            nonce: note.nonce,
            preimage: note.preimage,
            is_transient: false,
            index: Some(note.index),
        }));
        notes
    }

    pub async fn get_function_abi(
        &self,
        contract: AztecAddress,
        selector: FunctionSelector,
    ) -> Result<FunctionAbi> {
        self.oracle
            .get_function_abi(contract, selector)
            .await
            .ok_or(PxeError::OracleLookupFailed(OracleLookup::FunctionAbi {
                contract,
                selector,
            }))
    }

    pub async fn get_portal_contract_address(&self, contract: AztecAddress) -> Result<EthAddress> {
        self.oracle
            .get_portal_contract_address(contract)
            .await
            .ok_or(PxeError::OracleLookupFailed(
                OracleLookup::PortalContractAddress(contract),
            ))
    }

    pub async fn get_secret_key(
        &self,
        contract: AztecAddress,
        owner: &PublicKey,
    ) -> Result<SecretKey> {
        self.oracle
            .get_secret_key(contract, owner)
            .await
            .ok_or(PxeError::OracleLookupFailed(OracleLookup::SecretKey(*owner)))
    }

    /// Membership witness for a note hash. Notes created in this
    /// transaction have no leaf yet and get an empty path.
    pub async fn get_commitment_witness(
        &self,
        contract: AztecAddress,
        note_hash: Fr,
    ) -> Result<(CommitmentWitness, bool)> {
        let pending = self
            .pending_notes
            .values()
            .flatten()
            .any(|note| note.contract_address == contract && note.unique_siloed_note_hash == note_hash);
        if pending {
            return Ok((
                CommitmentWitness {
                    commitment: note_hash,
                    index: 0,
                    sibling_path: Vec::new(),
                },
                true,
            ));
        }
        let witness = self
            .oracle
            .get_commitment_witness(contract, note_hash)
            .await
            .ok_or(PxeError::OracleLookupFailed(
                OracleLookup::CommitmentWitness {
                    contract,
                    note_hash,
                },
            ))?;
        Ok((witness, false))
    }

    pub async fn get_l1_to_l2_message(&self, msg_key: Fr) -> Result<L1ToL2MessageWitness> {
        self.oracle
            .get_l1_to_l2_message(msg_key)
            .await
            .ok_or(PxeError::OracleLookupFailed(OracleLookup::L1ToL2Message(
                msg_key,
            )))
    }
}
