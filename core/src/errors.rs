/*
Error types for private execution
Every error is fatal to the transaction being built: the engine aborts and
surfaces the kind to the caller, who decides whether to retry.
*/

use crate::abi::FunctionType;
use crate::field::Fr;
use crate::types::{AztecAddress, FunctionSelector, PublicKey};
use core::fmt;
use thiserror::Error;

/// Identifies which data oracle lookup came back empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleLookup {
    FunctionAbi {
        contract: AztecAddress,
        selector: FunctionSelector,
    },
    PortalContractAddress(AztecAddress),
    SecretKey(PublicKey),
    CommitmentWitness {
        contract: AztecAddress,
        note_hash: Fr,
    },
    L1ToL2Message(Fr),
}

impl fmt::Display for OracleLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OracleLookup::FunctionAbi { contract, selector } => {
                write!(f, "function abi {selector} of contract {contract}")
            }
            OracleLookup::PortalContractAddress(contract) => {
                write!(f, "portal contract address of {contract}")
            }
            OracleLookup::SecretKey(key) => write!(f, "secret key for public key ({}, {})", key.x, key.y),
            OracleLookup::CommitmentWitness {
                contract,
                note_hash,
            } => write!(f, "commitment {note_hash} of contract {contract}"),
            OracleLookup::L1ToL2Message(key) => write!(f, "l1 to l2 message {key}"),
        }
    }
}

/// Errors that can occur while simulating, proving or assembling a transaction
#[derive(Debug, Error)]
pub enum PxeError {
    /// Entry point's declared kind does not match the requested simulation mode
    #[error("cannot run {actual:?} function {function} as {expected:?}")]
    AbiKindMismatch {
        function: String,
        expected: FunctionType,
        actual: FunctionType,
    },

    /// Packed-argument hash not present in the transaction's cache
    #[error("packed arguments not found for hash {0}")]
    ArgsNotFound(Fr),

    /// Contract lacks the note hash / nullifier selector
    #[error("mandatory implementation of \"{signature}\" missing in contract {contract}")]
    MissingNoteHashImplementation {
        contract: AztecAddress,
        signature: &'static str,
    },

    /// A data oracle lookup returned nothing for a required key
    #[error("oracle lookup failed: {0}")]
    OracleLookupFailed(OracleLookup),

    /// Unconstrained simulation needs node data but no node handle was supplied
    #[error("node handle required to resolve {0}")]
    MissingNodeHandle(&'static str),

    /// Fewer unencrypted than encrypted function logs
    #[error("number of unencrypted function logs ({unencrypted}) has to be equal or larger than encrypted ({encrypted})")]
    InconsistentLogCount { encrypted: usize, unencrypted: usize },

    /// Kernel output references more public calls than were collected
    #[error("missing preimages for enqueued public function calls (expected {expected}, got {actual})")]
    MissingPublicCallPreimage { expected: usize, actual: usize },

    /// Transaction requests must enter through a private function
    #[error("public entrypoints are not allowed")]
    PublicEntrypoint,

    /// Bytecode read a register nothing wrote
    #[error("{function}: register {register} read before assignment")]
    UnassignedRegister { function: String, register: u32 },

    /// Register range runs past the end of the register file
    #[error("{function}: register range starting at {start} with length {len} is out of bounds")]
    InvalidRegister {
        function: String,
        start: u32,
        len: usize,
    },

    /// Assertion in the simulated function failed
    #[error("{function}: constraint violated at instruction {pc}: {lhs} != {rhs}")]
    ConstraintViolation {
        function: String,
        pc: usize,
        lhs: Fr,
        rhs: Fr,
    },

    /// Jump outside the program
    #[error("{function}: invalid jump target {target}")]
    InvalidJump { function: String, target: usize },

    /// Nested calls went deeper than the configured limit
    #[error("call depth limit {0} exceeded")]
    CallDepthExceeded(usize),

    /// A single function executed more instructions than allowed
    #[error("{function}: step limit {limit} exceeded")]
    StepLimitExceeded { function: String, limit: usize },

    /// Instruction not available in the current execution mode
    #[error("{function}: instruction {instruction} is not allowed in {mode} functions")]
    UnsupportedInstruction {
        function: String,
        instruction: &'static str,
        mode: &'static str,
    },

    /// Call arguments do not match the function's declared parameters
    #[error("invalid arguments for {function}: {reason}")]
    InvalidArguments { function: String, reason: String },

    /// More side effects than the fixed-size kernel arrays hold
    #[error("too many {kind} in transaction (limit {limit})")]
    TooManySideEffects { kind: &'static str, limit: usize },

    /// Note preimage longer than the contract's declared array
    #[error("note preimage of length {len} exceeds declared length {max}")]
    PreimageTooLong { len: usize, max: usize },

    /// Assembled transaction carries no nullifiers
    #[error("cannot get tx hash since first nullifier is missing")]
    MissingTxHash,

    /// Proving stage failed
    #[error("prover error: {0}")]
    Prover(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    SerializationError(String),
}

/// Result type for engine operations
pub type Result<T> = core::result::Result<T, PxeError>;

impl From<bincode::Error> for PxeError {
    fn from(err: bincode::Error) -> Self {
        PxeError::SerializationError(err.to_string())
    }
}

impl From<serde_json::Error> for PxeError {
    fn from(err: serde_json::Error) -> Self {
        PxeError::SerializationError(err.to_string())
    }
}
