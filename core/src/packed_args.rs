//! Content-addressed store of argument arrays
//!
//! Calls reference their arguments by hash. The cache is seeded with the
//! preimages shipped in the transaction request and grows whenever a
//! nested call packs a fresh argument list. It lives for exactly one
//! transaction.

use crate::errors::{PxeError, Result};
use crate::field::Fr;
use crate::hashing::{Backend, GeneratorIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::trace;

/// Hash of an argument list. The empty list hashes to zero.
///
/// # Arguments
/// * `args` - Flattened call arguments
/// * `backend` - Field hasher, domain `FunctionArgs`
pub fn compute_args_hash(args: &[Fr], backend: &Backend) -> Fr {
    if args.is_empty() {
        return Fr::ZERO;
    }
    backend.hash(GeneratorIndex::FunctionArgs, args)
}

/// An argument list together with its hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedArguments {
    pub vec: Vec<Fr>,
    pub hash: Fr,
}

impl PackedArguments {
    pub fn from_args(args: Vec<Fr>, backend: &Backend) -> Self {
        let hash = compute_args_hash(&args, backend);
        Self { vec: args, hash }
    }
}

pub struct PackedArgsCache {
    backend: Backend,
    cache: HashMap<Fr, Vec<Fr>>,
}

impl PackedArgsCache {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            cache: HashMap::new(),
        }
    }

    /// Create a cache seeded with the request's packed arguments
    pub fn with_initial(backend: Backend, initial: &[PackedArguments]) -> Self {
        let mut cache = Self::new(backend);
        for packed in initial {
            cache.cache.insert(packed.hash, packed.vec.clone());
        }
        cache
    }

    /// Look up the arguments behind `hash`
    pub fn unpack(&self, hash: Fr) -> Result<Vec<Fr>> {
        if hash.is_zero() {
            return Ok(Vec::new());
        }
        self.cache
            .get(&hash)
            .cloned()
            .ok_or(PxeError::ArgsNotFound(hash))
    }

    /// Store `args` and return their hash
    pub fn pack(&mut self, args: Vec<Fr>) -> Fr {
        let hash = compute_args_hash(&args, &self.backend);
        if !hash.is_zero() {
            trace!(%hash, len = args.len(), "packing arguments");
            self.cache.entry(hash).or_insert(args);
        }
        hash
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
