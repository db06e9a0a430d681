//! In-memory data oracle
//!
//! A BTreeMap-backed registry of contracts, keys, committed notes and
//! L1 to L2 messages implementing [`DataOracle`] and [`AztecNode`].
//! It keeps no merkle trees: commitments are an append-only leaf list and
//! sibling paths are zero-filled to the configured tree height.

use crate::abi::FunctionAbi;
use crate::field::Fr;
use crate::hashing::Backend;
use crate::note_hash::{
    compute_inner_note_hash, compute_siloed_note_hash, compute_unique_siloed_note_hash,
};
use crate::oracle::{AztecNode, CommitmentWitness, DataOracle, L1ToL2MessageWitness, NoteData};
use crate::types::{AztecAddress, EthAddress, FunctionSelector, PublicKey, SecretKey};
use async_trait::async_trait;
use std::collections::BTreeMap;

pub const PRIVATE_DATA_TREE_HEIGHT: usize = 32;
pub const L1_TO_L2_MSG_TREE_HEIGHT: usize = 16;

/// A deployed contract
///
/// - Portal contract on L1
/// - Function ABIs by selector
/// - Public storage slots
#[derive(Debug, Clone, Default)]
pub struct ContractState {
    pub portal_contract_address: EthAddress,
    pub functions: BTreeMap<FunctionSelector, FunctionAbi>,
    pub storage: BTreeMap<Fr, Fr>,
}

impl ContractState {
    pub fn new(portal_contract_address: EthAddress) -> Self {
        Self {
            portal_contract_address,
            ..Default::default()
        }
    }

    /// Register a function under its own selector
    pub fn with_function(mut self, abi: FunctionAbi) -> Self {
        self.functions.insert(abi.selector(), abi);
        self
    }

    /// Set a storage slot value; zero clears the slot
    pub fn set_storage(&mut self, slot: Fr, value: Fr) {
        if value.is_zero() {
            self.storage.remove(&slot);
        } else {
            self.storage.insert(slot, value);
        }
    }

    pub fn get_storage(&self, slot: &Fr) -> Fr {
        self.storage.get(slot).copied().unwrap_or(Fr::ZERO)
    }
}

#[derive(Clone)]
pub struct InMemoryDataOracle {
    backend: Backend,
    contracts: BTreeMap<AztecAddress, ContractState>,
    keys: BTreeMap<PublicKey, SecretKey>,
    notes: BTreeMap<(AztecAddress, Fr), Vec<NoteData>>,
    /// Private data tree leaves (unique siloed note hashes)
    commitments: Vec<Fr>,
    l1_to_l2_messages: BTreeMap<Fr, (Vec<Fr>, u64)>,
    /// Next free leaf in the message tree
    l1_to_l2_leaf_count: u64,
    block_height: u64,
}

impl InMemoryDataOracle {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            contracts: BTreeMap::new(),
            keys: BTreeMap::new(),
            notes: BTreeMap::new(),
            commitments: Vec::new(),
            l1_to_l2_messages: BTreeMap::new(),
            l1_to_l2_leaf_count: 0,
            block_height: 0,
        }
    }

    pub fn insert_contract(&mut self, address: AztecAddress, contract: ContractState) {
        self.contracts.insert(address, contract);
    }

    pub fn get_contract(&self, address: &AztecAddress) -> Option<&ContractState> {
        self.contracts.get(address)
    }

    pub fn get_contract_mut(&mut self, address: &AztecAddress) -> Option<&mut ContractState> {
        self.contracts.get_mut(address)
    }

    pub fn insert_key(&mut self, public_key: PublicKey, secret_key: SecretKey) {
        self.keys.insert(public_key, secret_key);
    }

    /// Commit a note: store it for lookups and append its unique siloed
    /// hash to the private data tree. Returns the leaf index.
    pub fn insert_note(&mut self, mut note: NoteData) -> u64 {
        let inner = compute_inner_note_hash(&self.backend, note.storage_slot, &note.preimage);
        let siloed = compute_siloed_note_hash(&self.backend, note.contract_address, inner);
        let unique = compute_unique_siloed_note_hash(&self.backend, note.nonce, siloed);
        let index = self.commitments.len() as u64;
        self.commitments.push(unique);
        note.index = index;
        self.notes
            .entry((note.contract_address, note.storage_slot))
            .or_default()
            .push(note);
        index
    }

    /// Drop every note whose siloed nullifier appears in `nullifiers`
    pub fn remove_nullified_notes(&mut self, nullifiers: &[Fr]) {
        for notes in self.notes.values_mut() {
            notes.retain(|note| !nullifiers.contains(&note.siloed_nullifier));
        }
    }

    /// Append a message to the L1 to L2 tree and return its leaf index.
    /// Re-inserting a key appends a fresh leaf and points the key at it.
    pub fn insert_l1_to_l2_message(&mut self, msg_key: Fr, message: Vec<Fr>) -> u64 {
        let index = self.l1_to_l2_leaf_count;
        self.l1_to_l2_leaf_count += 1;
        self.l1_to_l2_messages.insert(msg_key, (message, index));
        index
    }

    pub fn set_block_height(&mut self, height: u64) {
        self.block_height = height;
    }

    pub fn commitment_count(&self) -> usize {
        self.commitments.len()
    }

    pub fn note_count(&self) -> usize {
        self.notes.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl DataOracle for InMemoryDataOracle {
    async fn get_function_abi(
        &self,
        contract: AztecAddress,
        selector: FunctionSelector,
    ) -> Option<FunctionAbi> {
        self.contracts
            .get(&contract)
            .and_then(|c| c.functions.get(&selector))
            .cloned()
    }

    async fn get_portal_contract_address(&self, contract: AztecAddress) -> Option<EthAddress> {
        self.contracts
            .get(&contract)
            .map(|c| c.portal_contract_address)
    }

    async fn get_secret_key(&self, _contract: AztecAddress, owner: &PublicKey) -> Option<SecretKey> {
        self.keys.get(owner).copied()
    }

    async fn get_notes(&self, contract: AztecAddress, storage_slot: Fr) -> Vec<NoteData> {
        self.notes
            .get(&(contract, storage_slot))
            .cloned()
            .unwrap_or_default()
    }

    async fn get_commitment_witness(
        &self,
        _contract: AztecAddress,
        note_hash: Fr,
    ) -> Option<CommitmentWitness> {
        let index = self.commitments.iter().position(|leaf| *leaf == note_hash)?;
        Some(CommitmentWitness {
            commitment: note_hash,
            index: index as u64,
            sibling_path: vec![Fr::ZERO; PRIVATE_DATA_TREE_HEIGHT],
        })
    }

    async fn get_l1_to_l2_message(&self, msg_key: Fr) -> Option<L1ToL2MessageWitness> {
        let (message, index) = self.l1_to_l2_messages.get(&msg_key)?;
        Some(L1ToL2MessageWitness {
            message: message.clone(),
            index: *index,
            sibling_path: vec![Fr::ZERO; L1_TO_L2_MSG_TREE_HEIGHT],
        })
    }
}

#[async_trait]
impl AztecNode for InMemoryDataOracle {
    async fn get_block_height(&self) -> u64 {
        self.block_height
    }

    async fn get_public_storage_at(&self, contract: AztecAddress, slot: Fr) -> Fr {
        self.contracts
            .get(&contract)
            .map(|c| c.get_storage(&slot))
            .unwrap_or(Fr::ZERO)
    }
}
