//! Note hash and nullifier derivation
//!
//! ```text
//! inner     = H(INNER_NOTE_HASH,  slot, preimage..)
//! siloed    = H(SILOED_NOTE_HASH, contract, inner)
//! unique    = H(UNIQUE_NOTE_HASH, nonce, siloed)
//! nullifier = H(NULLIFIER,        secret, unique)
//! ```
//!
//! Contracts may define their own inner hash and nullifier through the
//! `compute_note_hash_and_nullifier` entrypoint; these functions are the
//! default derivation the bundled fixtures and the in-memory oracle use.

use crate::field::Fr;
use crate::hashing::{Backend, GeneratorIndex};
use crate::types::AztecAddress;
use serde::{Deserialize, Serialize};

/// Every hash derived for a single note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteHashAndNullifier {
    pub inner_note_hash: Fr,
    pub siloed_note_hash: Fr,
    pub unique_siloed_note_hash: Fr,
    pub inner_nullifier: Fr,
}

pub fn compute_inner_note_hash(backend: &Backend, storage_slot: Fr, preimage: &[Fr]) -> Fr {
    let mut inputs = Vec::with_capacity(preimage.len() + 1);
    inputs.push(storage_slot);
    inputs.extend_from_slice(preimage);
    backend.hash(GeneratorIndex::InnerNoteHash, &inputs)
}

pub fn compute_siloed_note_hash(backend: &Backend, contract: AztecAddress, inner: Fr) -> Fr {
    backend.hash(GeneratorIndex::SiloedNoteHash, &[contract.to_field(), inner])
}

pub fn compute_unique_siloed_note_hash(backend: &Backend, nonce: Fr, siloed: Fr) -> Fr {
    backend.hash(GeneratorIndex::UniqueNoteHash, &[nonce, siloed])
}

pub fn compute_inner_nullifier(backend: &Backend, secret: Fr, unique_siloed: Fr) -> Fr {
    backend.hash(GeneratorIndex::Nullifier, &[secret, unique_siloed])
}

/// Nonce of the `counter`-th note created at (contract, slot) in the
/// transaction identified by `tx_nullifier`
pub fn compute_note_nonce(
    backend: &Backend,
    tx_nullifier: Fr,
    contract: AztecAddress,
    storage_slot: Fr,
    counter: u64,
) -> Fr {
    backend.hash(
        GeneratorIndex::NoteNonce,
        &[tx_nullifier, contract.to_field(), storage_slot, Fr::from(counter)],
    )
}

/// Derive the full hash chain for a note
///
/// # Arguments
/// * `contract` - Contract the note is siloed to
/// * `nonce` - Note nonce
/// * `storage_slot` - Slot the note lives in
/// * `preimage` - Note fields
/// * `secret` - Owner's secret, keys the nullifier
///
/// # Returns
/// The four derived quantities
pub fn derive_note_hashes(
    backend: &Backend,
    contract: AztecAddress,
    nonce: Fr,
    storage_slot: Fr,
    preimage: &[Fr],
    secret: Fr,
) -> NoteHashAndNullifier {
    let inner_note_hash = compute_inner_note_hash(backend, storage_slot, preimage);
    let siloed_note_hash = compute_siloed_note_hash(backend, contract, inner_note_hash);
    let unique_siloed_note_hash = compute_unique_siloed_note_hash(backend, nonce, siloed_note_hash);
    NoteHashAndNullifier {
        inner_note_hash,
        siloed_note_hash,
        unique_siloed_note_hash,
        inner_nullifier: compute_inner_nullifier(backend, secret, unique_siloed_note_hash),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::KeccakBackend;
    use proptest::prelude::*;

    fn derive(contract: u64, nonce: u64, slot: u64, preimage: &[u64], secret: u64) -> NoteHashAndNullifier {
        let preimage: Vec<Fr> = preimage.iter().copied().map(Fr::from).collect();
        derive_note_hashes(
            &KeccakBackend::shared(),
            AztecAddress::from_u64(contract),
            Fr::from(nonce),
            Fr::from(slot),
            &preimage,
            Fr::from(secret),
        )
    }

    #[test]
    fn test_chain_is_consistent() {
        let backend = KeccakBackend::shared();
        let hashes = derive(1, 2, 3, &[4, 5], 6);
        let inner = compute_inner_note_hash(&backend, Fr::from(3), &[Fr::from(4), Fr::from(5)]);
        let siloed = compute_siloed_note_hash(&backend, AztecAddress::from_u64(1), inner);
        let unique = compute_unique_siloed_note_hash(&backend, Fr::from(2), siloed);
        assert_eq!(hashes.inner_note_hash, inner);
        assert_eq!(hashes.siloed_note_hash, siloed);
        assert_eq!(hashes.unique_siloed_note_hash, unique);
        assert_eq!(
            hashes.inner_nullifier,
            compute_inner_nullifier(&backend, Fr::from(6), unique)
        );
    }

    #[test]
    fn test_identical_preimages_get_distinct_unique_hashes() {
        let a = derive(1, 10, 3, &[4], 6);
        let b = derive(1, 11, 3, &[4], 6);
        assert_eq!(a.siloed_note_hash, b.siloed_note_hash);
        assert_ne!(a.unique_siloed_note_hash, b.unique_siloed_note_hash);
        assert_ne!(a.inner_nullifier, b.inner_nullifier);
    }

    #[test]
    fn test_nonce_depends_on_counter_and_slot() {
        let backend = KeccakBackend::shared();
        let contract = AztecAddress::from_u64(1);
        let seed = Fr::from(99);
        let n0 = compute_note_nonce(&backend, seed, contract, Fr::from(1), 0);
        let n1 = compute_note_nonce(&backend, seed, contract, Fr::from(1), 1);
        let other_slot = compute_note_nonce(&backend, seed, contract, Fr::from(2), 0);
        assert_ne!(n0, n1);
        assert_ne!(n0, other_slot);
    }

    proptest! {
        #[test]
        fn prop_derivation_deterministic_and_sensitive(
            contract in 1u64..1_000,
            nonce in 0u64..1_000,
            slot in 0u64..1_000,
            preimage in proptest::collection::vec(any::<u64>(), 0..4),
            secret in any::<u64>(),
        ) {
            let first = derive(contract, nonce, slot, &preimage, secret);
            prop_assert_eq!(first, derive(contract, nonce, slot, &preimage, secret));

            prop_assert_ne!(first, derive(contract + 1, nonce, slot, &preimage, secret));
            prop_assert_ne!(first, derive(contract, nonce + 1, slot, &preimage, secret));
            prop_assert_ne!(first, derive(contract, nonce, slot + 1, &preimage, secret));
            prop_assert_ne!(first, derive(contract, nonce, slot, &preimage, secret.wrapping_add(1)));
            let mut longer = preimage.clone();
            longer.push(0);
            prop_assert_ne!(first, derive(contract, nonce, slot, &longer, secret));
        }
    }
}
