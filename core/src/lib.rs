//! # PXE Core
//!
//! Client-side private execution for a privacy-focused L2 rollup.
//!
//! A user's wallet simulates private functions locally, derives the notes
//! and nullifiers they create, squashes the ones that cancel within the
//! transaction and hands the result to a kernel prover. Nothing private
//! leaves the client except through the proof.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │ TxExecutionRequest   │ ── origin, selector, packed args
//! └──────────┬───────────┘
//!            │
//!            ▼
//! ┌──────────────────────┐     ┌────────────┐
//! │ Simulator            │ ◀── │ DataOracle │ ── abis, keys, notes, witnesses
//! │  private executor    │     └────────────┘
//! │  (shared context)    │
//! └──────────┬───────────┘
//!            │ ExecutionResult (call tree)
//!            ▼
//! ┌──────────────────────┐
//! │ squash               │ ── transient notes cancel in place
//! └──────────┬───────────┘
//!            │
//!            ▼
//! ┌──────────────────────┐
//! │ KernelProver         │ ── public inputs + proof
//! └──────────┬───────────┘
//!            │
//!            ▼
//! ┌──────────────────────┐
//! │ Tx                   │ ── tx hash = first nullifier
//! └──────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pxe_core::prelude::*;
//! use std::sync::Arc;
//!
//! let backend = KeccakBackend::shared();
//! let mut oracle = InMemoryDataOracle::new(backend.clone());
//! oracle.insert_contract(contract, ContractState::new(portal).with_function(transfer_abi.clone()));
//! oracle.insert_key(owner, secret);
//!
//! let simulator = Simulator::new(Arc::new(oracle), backend.clone());
//! let builder = TxBuilder::new(simulator, Arc::new(MockKernelProver::new(backend.clone())));
//!
//! let request = TxExecutionRequest::new(
//!     contract,
//!     FunctionData::from_abi(&transfer_abi),
//!     args,
//!     TxContext::default(),
//!     &backend,
//! );
//! let tx = builder.build(&request, HistoricBlockData::default(), None).await?;
//! println!("tx hash: {}", tx.tx_hash()?);
//! ```
//!
//! ## Modules
//!
//! - [`field`] - BN254 scalar field element
//! - [`types`] - Addresses, keys and selectors
//! - [`errors`] - Error types and Result alias
//! - [`config`] - Simulator limits
//! - [`hashing`] - Keccak helpers and the circuits backend
//! - [`abi`] - Function ABIs and argument encoding
//! - [`bytecode`] - Register-machine instruction set
//! - [`input`] - Request and call context types
//! - [`packed_args`] - Packed-arguments cache
//! - [`note_hash`] - Note hash and nullifier derivation
//! - [`oracle`] - Data oracle and node boundaries
//! - [`state`] - In-memory oracle
//! - [`context`] - Transaction-wide execution context
//! - [`vm`] - Bytecode interpreter
//! - [`private_execution`] / [`unconstrained_execution`] - Executors
//! - [`simulator`] - Simulation entry points
//! - [`output`] - Execution results and logs
//! - [`squash`] - Transient note squashing
//! - [`kernel`] - Kernel prover boundary
//! - [`tx`] - Assembled transactions
//! - [`pipeline`] - Request to transaction

pub mod abi;
pub mod bytecode;
pub mod config;
pub mod context;
pub mod errors;
pub mod field;
pub mod hashing;
pub mod input;
pub mod kernel;
pub mod note_hash;
pub mod oracle;
pub mod output;
pub mod packed_args;
pub mod pipeline;
pub mod private_execution;
pub mod simulator;
pub mod squash;
pub mod state;
pub mod tx;
pub mod types;
pub mod unconstrained_execution;
pub mod vm;

#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use abi::{encode_arguments, AbiType, AbiValue, FunctionAbi, FunctionData, FunctionType};
pub use config::SimulatorConfig;
pub use context::ExecutionContext;
pub use errors::{OracleLookup, PxeError, Result};
pub use field::Fr;
pub use hashing::{Backend, CircuitsBackend, GeneratorIndex, KeccakBackend};
pub use input::{
    CallContext, FunctionCall, HistoricBlockData, TxContext, TxExecutionRequest, TxRequest,
};
pub use kernel::{KernelProver, KernelPublicInputs, MockKernelProver, Proof};
pub use note_hash::NoteHashAndNullifier;
pub use oracle::{AztecNode, DataOracle, NoteData, SharedNode, SharedOracle};
pub use output::{ExecutionResult, NewCommitment, NewNullifier, PublicCallRequest};
pub use packed_args::{PackedArgsCache, PackedArguments};
pub use pipeline::TxBuilder;
pub use simulator::Simulator;
pub use squash::{squash, PaddedArray, SquashedSideEffects};
pub use state::{ContractState, InMemoryDataOracle};
pub use tx::{ContractDao, Tx};
pub use types::{AztecAddress, EthAddress, FunctionSelector, Hash, PublicKey};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        AztecAddress, AztecNode, Backend, CallContext, ContractDao, ContractState, DataOracle,
        EthAddress, ExecutionResult, Fr, FunctionAbi, FunctionCall, FunctionData, FunctionType,
        HistoricBlockData, InMemoryDataOracle, KeccakBackend, KernelProver, MockKernelProver,
        PublicKey, PxeError, Result, Simulator, SimulatorConfig, Tx, TxBuilder, TxContext,
        TxExecutionRequest,
    };
}
