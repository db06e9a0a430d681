//! Register-machine bytecode for contract functions
//!
//! Every function is a flat list of [`Instruction`]s over an unbounded
//! set of field-valued registers. Arguments are loaded into registers
//! `0..n` before the first instruction runs. Oracle instructions are the
//! only way a program reaches outside state; side-effect instructions
//! record into the execution context and are rejected in unconstrained
//! functions.

use crate::field::Fr;
use crate::hashing::GeneratorIndex;
use crate::input::HistoricRoot;
use crate::types::FunctionSelector;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Register index
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Reg(pub u32);

impl fmt::Debug for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Contiguous register range `start..start + len`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegRange {
    pub start: Reg,
    pub len: u32,
}

impl RegRange {
    pub fn new(start: u32, len: u32) -> Self {
        Self {
            start: Reg(start),
            len,
        }
    }

    /// One past the last register, or `None` when the range runs past
    /// the register file
    pub fn end(&self) -> Option<u32> {
        self.start.0.checked_add(self.len)
    }

    /// Registers of the range in order. A range without an [`end`] yields
    /// nothing, so callers validate it first.
    ///
    /// [`end`]: RegRange::end
    pub fn iter(&self) -> impl Iterator<Item = Reg> {
        let start = self.start.0;
        (start..self.end().unwrap_or(start)).map(Reg)
    }
}

/// Values of the call context a program can read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContextItem {
    MsgSender,
    ContractAddress,
    PortalContractAddress,
    IsDelegateCall,
    IsStaticCall,
    IsContractDeployment,
    ChainId,
    Version,
    HistoricRoot(HistoricRoot),
    BlockHash,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    // Arithmetic and control flow
    Const { dst: Reg, value: Fr },
    Mov { dst: Reg, src: Reg },
    Add { dst: Reg, lhs: Reg, rhs: Reg },
    Sub { dst: Reg, lhs: Reg, rhs: Reg },
    Mul { dst: Reg, lhs: Reg, rhs: Reg },
    /// `dst = (lhs == rhs)`
    Eq { dst: Reg, lhs: Reg, rhs: Reg },
    AssertEq { lhs: Reg, rhs: Reg },
    Jump { target: usize },
    /// Jump when `cond` is non-zero
    JumpIf { cond: Reg, target: usize },
    Hash { dst: Reg, index: GeneratorIndex, inputs: RegRange },
    LoadContext { dst: Reg, item: ContextItem },

    // Oracle reads
    GetSecretKey { dst: Reg, owner_x: Reg, owner_y: Reg },
    /// Writes `count` followed by `limit` slots of `[nonce, preimage..]`,
    /// each padded with zeros to `note_len` preimage fields.
    GetNotes { dst: Reg, slot: Reg, limit: u32, note_len: u32 },
    /// Writes `[commitment, index, sibling_path..]`
    GetCommitmentWitness { dst: Reg, note_hash: Reg, path_len: u32 },
    /// Writes `[index, message.., sibling_path..]`
    GetL1ToL2Message { dst: Reg, msg_key: Reg, message_len: u32, path_len: u32 },

    // Side effects
    CreateNote { slot: Reg, preimage: RegRange },
    /// Nullify a note given its nonce and preimage; `secret` is the owner key
    NullifyNote { slot: Reg, nonce: Reg, preimage: RegRange, secret: Reg },
    EmitNullifier { nullifier: Reg },
    PackArguments { dst: Reg, args: RegRange },
    CallPrivateFunction {
        target: Reg,
        selector: FunctionSelector,
        args_hash: Reg,
        dst: Reg,
        return_len: u32,
    },
    EnqueuePublicFunctionCall { target: Reg, selector: FunctionSelector, args_hash: Reg },
    EmitEncryptedLog { payload: RegRange },
    EmitUnencryptedLog { payload: RegRange },

    // Node reads, unconstrained only
    GetBlockHeight { dst: Reg },
    GetPublicStorageAt { dst: Reg, contract: Reg, slot: Reg },

    Return { values: RegRange },
}

impl Instruction {
    pub fn name(&self) -> &'static str {
        match self {
            Instruction::Const { .. } => "const",
            Instruction::Mov { .. } => "mov",
            Instruction::Add { .. } => "add",
            Instruction::Sub { .. } => "sub",
            Instruction::Mul { .. } => "mul",
            Instruction::Eq { .. } => "eq",
            Instruction::AssertEq { .. } => "assert_eq",
            Instruction::Jump { .. } => "jump",
            Instruction::JumpIf { .. } => "jump_if",
            Instruction::Hash { .. } => "hash",
            Instruction::LoadContext { .. } => "load_context",
            Instruction::GetSecretKey { .. } => "get_secret_key",
            Instruction::GetNotes { .. } => "get_notes",
            Instruction::GetCommitmentWitness { .. } => "get_commitment_witness",
            Instruction::GetL1ToL2Message { .. } => "get_l1_to_l2_message",
            Instruction::CreateNote { .. } => "create_note",
            Instruction::NullifyNote { .. } => "nullify_note",
            Instruction::EmitNullifier { .. } => "emit_nullifier",
            Instruction::PackArguments { .. } => "pack_arguments",
            Instruction::CallPrivateFunction { .. } => "call_private_function",
            Instruction::EnqueuePublicFunctionCall { .. } => "enqueue_public_function_call",
            Instruction::EmitEncryptedLog { .. } => "emit_encrypted_log",
            Instruction::EmitUnencryptedLog { .. } => "emit_unencrypted_log",
            Instruction::GetBlockHeight { .. } => "get_block_height",
            Instruction::GetPublicStorageAt { .. } => "get_public_storage_at",
            Instruction::Return { .. } => "return",
        }
    }

    /// Whether the instruction records a transaction side effect
    pub fn is_side_effect(&self) -> bool {
        matches!(
            self,
            Instruction::CreateNote { .. }
                | Instruction::NullifyNote { .. }
                | Instruction::EmitNullifier { .. }
                | Instruction::CallPrivateFunction { .. }
                | Instruction::EnqueuePublicFunctionCall { .. }
                | Instruction::EmitEncryptedLog { .. }
                | Instruction::EmitUnencryptedLog { .. }
        )
    }

    /// Whether the instruction queries the node directly
    pub fn is_node_query(&self) -> bool {
        matches!(
            self,
            Instruction::GetBlockHeight { .. } | Instruction::GetPublicStorageAt { .. }
        )
    }
}

/// A compiled function body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub instructions: Vec<Instruction>,
}

impl Program {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn to_bytes(&self) -> crate::errors::Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> crate::errors::Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reg_range_iter() {
        let regs: Vec<Reg> = RegRange::new(3, 2).iter().collect();
        assert_eq!(regs, vec![Reg(3), Reg(4)]);
        assert_eq!(RegRange::new(0, 0).iter().count(), 0);
    }

    #[test]
    fn test_reg_range_end() {
        assert_eq!(RegRange::new(3, 2).end(), Some(5));
        assert_eq!(RegRange::new(u32::MAX, 0).end(), Some(u32::MAX));
        assert_eq!(RegRange::new(u32::MAX, 2).end(), None);
        assert_eq!(RegRange::new(u32::MAX, 2).iter().count(), 0);
    }

    #[test]
    fn test_instruction_classes() {
        let note = Instruction::CreateNote {
            slot: Reg(0),
            preimage: RegRange::new(1, 1),
        };
        assert!(note.is_side_effect());
        assert!(!note.is_node_query());
        let height = Instruction::GetBlockHeight { dst: Reg(0) };
        assert!(height.is_node_query());
        assert!(!height.is_side_effect());
        assert_eq!(height.name(), "get_block_height");
    }

    #[test]
    fn test_program_bytes() {
        let program = Program::new(vec![
            Instruction::Const {
                dst: Reg(0),
                value: Fr::from(9),
            },
            Instruction::Return {
                values: RegRange::new(0, 1),
            },
        ]);
        let bytes = program.to_bytes().unwrap();
        assert_eq!(Program::from_bytes(&bytes).unwrap(), program);
    }
}
