//! Hashing utilities
//!
//! Two families live here:
//! - byte-level Keccak256 helpers used for log hashes and proof commitments;
//! - domain-separated field hashing, reached through the injected
//!   [`CircuitsBackend`] so every derived quantity (note hashes, nullifiers,
//!   argument hashes, tx hashes) uses exactly one well-known primitive.

use crate::errors::Result;
use crate::field::Fr;
use crate::types::{Hash, B256};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::sync::Arc;

/// Compute Keccak256 hash of arbitrary data
///
/// # Arguments
/// * `data` - Byte slice to hash
///
/// # Returns
/// 32-byte Keccak256 hash
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    B256::from_slice(&hasher.finalize())
}

/// Compute commitment hash for binding input to output
///
/// `commitment = keccak256(input_hash || output_hash)`
///
/// This is what a kernel proof binds to: the hash of the public inputs it
/// was given and the hash of the side effects it attests to.
///
/// # Arguments
/// * `input_hash` - Hash of the kernel's public inputs
/// * `output_hash` - Hash of the squashed side effects
///
/// # Returns
/// 32-byte commitment
pub fn compute_commitment(input_hash: &Hash, output_hash: &Hash) -> Hash {
    let mut data = [0u8; 64];
    data[..32].copy_from_slice(input_hash.as_slice());
    data[32..].copy_from_slice(output_hash.as_slice());
    keccak256(&data)
}

/// Hash a serializable struct
///
/// Uses bincode for deterministic serialization before hashing, so equal
/// values hash equally across runs.
///
/// # Arguments
/// * `value` - Any serializable value
///
/// # Returns
/// Keccak256 of the bincode encoding, or a serialization error
pub fn hash_struct<T: Serialize>(value: &T) -> Result<Hash> {
    let bytes = bincode::serialize(value)?;
    Ok(keccak256(&bytes))
}

/// Hash multiple values together
///
/// Concatenates all byte slices and hashes the result.
///
/// # Arguments
/// * `values` - Byte slices, hashed in order
///
/// # Returns
/// 32-byte Keccak256 hash of the concatenation
pub fn hash_concat(values: &[&[u8]]) -> Hash {
    let mut hasher = Keccak256::new();
    for value in values {
        hasher.update(value);
    }
    B256::from_slice(&hasher.finalize())
}

/// Domain separators for field hashing. Each derived quantity gets its own
/// index so that equal inputs never collide across purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum GeneratorIndex {
    InnerNoteHash = 1,
    SiloedNoteHash = 2,
    UniqueNoteHash = 3,
    Nullifier = 4,
    NoteNonce = 5,
    FunctionArgs = 6,
    FunctionData = 7,
    TxContext = 8,
    TxRequest = 9,
    CallContext = 10,
    PublicCallRequest = 11,
    BlockHash = 12,
}

/// Field-arithmetic and hash primitives shared by every component.
///
/// Created once per process and handed out as [`Backend`]; the proving
/// circuits re-derive the same hashes, so implementations must agree
/// bit-for-bit with the circuit's hash usage.
pub trait CircuitsBackend: Send + Sync {
    fn hash(&self, index: GeneratorIndex, inputs: &[Fr]) -> Fr;
}

/// Shared handle to the process-wide backend.
pub type Backend = Arc<dyn CircuitsBackend>;

/// Keccak256 over `index || inputs`, each input as 32 big-endian bytes,
/// reduced into the field.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeccakBackend;

impl KeccakBackend {
    pub fn shared() -> Backend {
        Arc::new(KeccakBackend)
    }
}

impl CircuitsBackend for KeccakBackend {
    fn hash(&self, index: GeneratorIndex, inputs: &[Fr]) -> Fr {
        let mut hasher = Keccak256::new();
        hasher.update((index as u32).to_be_bytes());
        for input in inputs {
            hasher.update(input.to_be_bytes());
        }
        let digest: [u8; 32] = hasher.finalize().into();
        Fr::from_be_bytes_mod_order(digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak256_empty() {
        let hash = keccak256(&[]);
        assert_eq!(
            hex::encode(hash),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_commitment_different_inputs() {
        let input1 = B256::ZERO;
        let input2 = B256::repeat_byte(0x01);
        let output = B256::ZERO;

        let c1 = compute_commitment(&input1, &output);
        let c2 = compute_commitment(&input2, &output);
        assert_ne!(c1, c2);
        assert_eq!(c1, compute_commitment(&input1, &output));
    }

    #[test]
    fn test_hash_struct() {
        #[derive(serde::Serialize)]
        struct TestStruct {
            a: u64,
            b: u64,
        }

        let s1 = TestStruct { a: 1, b: 2 };
        let s2 = TestStruct { a: 1, b: 2 };
        let s3 = TestStruct { a: 2, b: 1 };

        assert_eq!(hash_struct(&s1).unwrap(), hash_struct(&s2).unwrap());
        assert_ne!(hash_struct(&s1).unwrap(), hash_struct(&s3).unwrap());
    }

    #[test]
    fn test_hash_concat() {
        let h1 = hash_concat(&[b"hello", b"world"]);
        let h2 = keccak256(b"helloworld");
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_domain_separation() {
        let backend = KeccakBackend;
        let inputs = [Fr::from(1), Fr::from(2)];
        let a = backend.hash(GeneratorIndex::InnerNoteHash, &inputs);
        let b = backend.hash(GeneratorIndex::SiloedNoteHash, &inputs);
        assert_ne!(a, b);
        assert_eq!(a, backend.hash(GeneratorIndex::InnerNoteHash, &inputs));
    }

    #[test]
    fn test_input_order_matters() {
        let backend = KeccakBackend;
        let a = backend.hash(GeneratorIndex::Nullifier, &[Fr::from(1), Fr::from(2)]);
        let b = backend.hash(GeneratorIndex::Nullifier, &[Fr::from(2), Fr::from(1)]);
        assert_ne!(a, b);
    }
}
