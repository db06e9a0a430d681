//! Bytecode interpreter shared by the private and unconstrained executors
//!
//! [`run`] evaluates arithmetic, control flow, hashing, context reads and
//! oracle reads itself. Instructions whose meaning depends on the
//! execution mode (side effects and node queries) are delegated to a
//! [`Host`], which decides whether to record them or reject them.

use crate::bytecode::{ContextItem, Instruction, Program, Reg, RegRange};
use crate::context::ExecutionContext;
use crate::errors::{PxeError, Result};
use crate::field::Fr;
use crate::input::CallContext;
use crate::output::ReadRequest;
use crate::types::{AztecAddress, PublicKey};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::trace;

/// Register file of one function invocation. Registers start unassigned;
/// reading one before writing it is an error.
#[derive(Debug, Clone, Default)]
pub struct Registers {
    function: String,
    values: BTreeMap<u32, Fr>,
}

impl Registers {
    /// Registers `0..args.len()` hold the arguments
    pub fn with_args(function: &str, args: &[Fr]) -> Result<Self> {
        let mut regs = Self {
            function: function.to_string(),
            values: BTreeMap::new(),
        };
        regs.write(Reg(0), args)?;
        Ok(regs)
    }

    pub fn get(&self, reg: Reg) -> Result<Fr> {
        self.values
            .get(&reg.0)
            .copied()
            .ok_or_else(|| PxeError::UnassignedRegister {
                function: self.function.clone(),
                register: reg.0,
            })
    }

    pub fn set(&mut self, reg: Reg, value: Fr) {
        self.values.insert(reg.0, value);
    }

    pub fn read(&self, range: RegRange) -> Result<Vec<Fr>> {
        if range.end().is_none() {
            return Err(self.out_of_bounds(range.start, range.len as usize));
        }
        range.iter().map(|reg| self.get(reg)).collect()
    }

    /// Write `values` to consecutive registers starting at `start`
    pub fn write(&mut self, start: Reg, values: &[Fr]) -> Result<()> {
        let end = u32::try_from(values.len())
            .ok()
            .and_then(|len| start.0.checked_add(len))
            .ok_or_else(|| self.out_of_bounds(start, values.len()))?;
        for (reg, value) in (start.0..end).zip(values) {
            self.values.insert(reg, *value);
        }
        Ok(())
    }

    /// Write exactly `len` values, truncating or zero-padding `values`
    pub fn write_padded(&mut self, start: Reg, values: &[Fr], len: usize) -> Result<()> {
        let mut padded = values.to_vec();
        padded.resize(len, Fr::ZERO);
        self.write(start, &padded)
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    fn out_of_bounds(&self, start: Reg, len: usize) -> PxeError {
        PxeError::InvalidRegister {
            function: self.function.clone(),
            start: start.0,
            len,
        }
    }
}

/// Mode-specific half of the interpreter
#[async_trait]
pub trait Host: Send + Sync {
    /// Name of the mode, used in error messages
    fn mode(&self) -> &'static str;

    fn context(&self) -> &ExecutionContext;

    fn call_context(&self) -> &CallContext;

    /// Record (or reject) a side-effect instruction
    async fn side_effect(&mut self, instruction: &Instruction, regs: &mut Registers) -> Result<()>;

    /// Answer (or reject) a node query
    async fn node_query(&mut self, instruction: &Instruction, regs: &mut Registers) -> Result<()>;

    /// Hash an argument list for a later call
    fn pack_arguments(&mut self, args: Vec<Fr>) -> Fr;

    /// Note a membership read; only private frames keep them
    fn record_read(&mut self, _request: ReadRequest) {}
}

/// Reject `instruction` in the host's mode
pub fn unsupported<H: Host + ?Sized>(host: &H, instruction: &Instruction, regs: &Registers) -> PxeError {
    PxeError::UnsupportedInstruction {
        function: regs.function().to_string(),
        instruction: instruction.name(),
        mode: host.mode(),
    }
}

/// Check a length operand against [`SimulatorConfig::max_operand_len`]
///
/// [`SimulatorConfig::max_operand_len`]: crate::config::SimulatorConfig::max_operand_len
pub fn operand_len(ctx: &ExecutionContext, regs: &Registers, name: &str, len: u32) -> Result<usize> {
    let max = ctx.config().max_operand_len;
    let len = len as usize;
    if len > max {
        return Err(PxeError::InvalidArguments {
            function: regs.function().to_string(),
            reason: format!("{name} {len} exceeds {max}"),
        });
    }
    Ok(len)
}

/// Execute `program` to completion and return its return values
///
/// # Arguments
/// * `host` - Mode-specific handler for side effects and node queries
/// * `program` - Function body
/// * `function` - Function name, used in errors and traces
/// * `args` - Flattened arguments, loaded into registers `0..args.len()`
///
/// # Returns
/// The values of the first `Return` reached; falling off the end of the
/// program returns no values
pub async fn run<H: Host>(
    host: &mut H,
    program: &Program,
    function: &str,
    args: &[Fr],
) -> Result<Vec<Fr>> {
    let max_steps = host.context().config().max_steps_per_call;
    let mut regs = Registers::with_args(function, args)?;
    let mut pc = 0usize;
    let mut steps = 0usize;

    while let Some(instruction) = program.instructions.get(pc) {
        steps += 1;
        if steps > max_steps {
            return Err(PxeError::StepLimitExceeded {
                function: function.to_string(),
                limit: max_steps,
            });
        }
        trace!(function, pc, op = instruction.name(), "step");

        let mut next = pc + 1;
        match instruction {
            Instruction::Const { dst, value } => regs.set(*dst, *value),
            Instruction::Mov { dst, src } => {
                let value = regs.get(*src)?;
                regs.set(*dst, value);
            }
            Instruction::Add { dst, lhs, rhs } => {
                let value = regs.get(*lhs)? + regs.get(*rhs)?;
                regs.set(*dst, value);
            }
            Instruction::Sub { dst, lhs, rhs } => {
                let value = regs.get(*lhs)? - regs.get(*rhs)?;
                regs.set(*dst, value);
            }
            Instruction::Mul { dst, lhs, rhs } => {
                let value = regs.get(*lhs)? * regs.get(*rhs)?;
                regs.set(*dst, value);
            }
            Instruction::Eq { dst, lhs, rhs } => {
                let value = Fr::from(regs.get(*lhs)? == regs.get(*rhs)?);
                regs.set(*dst, value);
            }
            Instruction::AssertEq { lhs, rhs } => {
                let (lhs, rhs) = (regs.get(*lhs)?, regs.get(*rhs)?);
                if lhs != rhs {
                    return Err(PxeError::ConstraintViolation {
                        function: function.to_string(),
                        pc,
                        lhs,
                        rhs,
                    });
                }
            }
            Instruction::Jump { target } => next = jump_target(program, function, *target)?,
            Instruction::JumpIf { cond, target } => {
                if !regs.get(*cond)?.is_zero() {
                    next = jump_target(program, function, *target)?;
                }
            }
            Instruction::Hash { dst, index, inputs } => {
                let inputs = regs.read(*inputs)?;
                let value = host.context().backend().hash(*index, &inputs);
                regs.set(*dst, value);
            }
            Instruction::LoadContext { dst, item } => {
                let value = load_context(host, *item);
                regs.set(*dst, value);
            }
            Instruction::PackArguments { dst, args } => {
                let args = regs.read(*args)?;
                let hash = host.pack_arguments(args);
                regs.set(*dst, hash);
            }
            Instruction::Return { values } => return regs.read(*values),
            Instruction::GetSecretKey { .. }
            | Instruction::GetNotes { .. }
            | Instruction::GetCommitmentWitness { .. }
            | Instruction::GetL1ToL2Message { .. } => {
                oracle_read(&mut *host, instruction, &mut regs).await?;
            }
            other if other.is_node_query() => host.node_query(other, &mut regs).await?,
            other => host.side_effect(other, &mut regs).await?,
        }
        pc = next;
    }
    Ok(Vec::new())
}

fn jump_target(program: &Program, function: &str, target: usize) -> Result<usize> {
    // jumping to the end is a valid way to finish
    if target > program.len() {
        return Err(PxeError::InvalidJump {
            function: function.to_string(),
            target,
        });
    }
    Ok(target)
}

fn load_context<H: Host>(host: &H, item: ContextItem) -> Fr {
    let call = host.call_context();
    let ctx = host.context();
    match item {
        ContextItem::MsgSender => call.msg_sender.to_field(),
        ContextItem::ContractAddress => call.storage_contract_address.to_field(),
        ContextItem::PortalContractAddress => call.portal_contract_address.to_field(),
        ContextItem::IsDelegateCall => Fr::from(call.is_delegate_call),
        ContextItem::IsStaticCall => Fr::from(call.is_static_call),
        ContextItem::IsContractDeployment => Fr::from(call.is_contract_deployment),
        ContextItem::ChainId => ctx.tx_context().chain_id,
        ContextItem::Version => ctx.tx_context().version,
        ContextItem::HistoricRoot(root) => ctx.historic_block_data().root(root),
        ContextItem::BlockHash => ctx.historic_block_data().block_hash(ctx.backend()),
    }
}

async fn oracle_read<H: Host>(
    host: &mut H,
    instruction: &Instruction,
    regs: &mut Registers,
) -> Result<()> {
    let contract: AztecAddress = host.call_context().storage_contract_address;
    match instruction {
        Instruction::GetSecretKey {
            dst,
            owner_x,
            owner_y,
        } => {
            let owner = PublicKey::new(regs.get(*owner_x)?, regs.get(*owner_y)?);
            let secret = host.context().get_secret_key(contract, &owner).await?;
            regs.set(*dst, secret);
        }
        Instruction::GetNotes {
            dst,
            slot,
            limit,
            note_len,
        } => {
            let max = host.context().config().max_notes_per_get;
            if *limit as usize > max {
                return Err(PxeError::InvalidArguments {
                    function: regs.function().to_string(),
                    reason: format!("get_notes limit {limit} exceeds {max}"),
                });
            }
            let note_len = operand_len(host.context(), regs, "note_len", *note_len)?;
            let slot = regs.get(*slot)?;
            let notes = host.context().get_notes(contract, slot).await;
            let returned = notes.len().min(*limit as usize);
            let mut out = vec![Fr::from(returned as u64)];
            for i in 0..*limit as usize {
                match notes.get(i) {
                    Some(note) => {
                        if note.preimage.len() > note_len {
                            return Err(PxeError::PreimageTooLong {
                                len: note.preimage.len(),
                                max: note_len,
                            });
                        }
                        out.push(note.nonce);
                        let mut preimage = note.preimage.clone();
                        preimage.resize(note_len, Fr::ZERO);
                        out.extend(preimage);
                    }
                    None => out.extend(std::iter::repeat(Fr::ZERO).take(note_len + 1)),
                }
            }
            regs.write(*dst, &out)?;
        }
        Instruction::GetCommitmentWitness {
            dst,
            note_hash,
            path_len,
        } => {
            let path_len = operand_len(host.context(), regs, "path_len", *path_len)?;
            let note_hash = regs.get(*note_hash)?;
            let (witness, is_transient) = host
                .context()
                .get_commitment_witness(contract, note_hash)
                .await?;
            host.record_read(ReadRequest {
                note_hash,
                index: witness.index,
                is_transient,
            });
            let mut out = vec![witness.commitment, Fr::from(witness.index)];
            let mut path = witness.sibling_path;
            path.resize(path_len, Fr::ZERO);
            out.extend(path);
            regs.write(*dst, &out)?;
        }
        Instruction::GetL1ToL2Message {
            dst,
            msg_key,
            message_len,
            path_len,
        } => {
            let message_len = operand_len(host.context(), regs, "message_len", *message_len)?;
            let path_len = operand_len(host.context(), regs, "path_len", *path_len)?;
            let msg_key = regs.get(*msg_key)?;
            let witness = host.context().get_l1_to_l2_message(msg_key).await?;
            let mut out = vec![Fr::from(witness.index)];
            let mut message = witness.message;
            message.resize(message_len, Fr::ZERO);
            out.extend(message);
            let mut path = witness.sibling_path;
            path.resize(path_len, Fr::ZERO);
            out.extend(path);
            regs.write(*dst, &out)?;
        }
        other => return Err(unsupported(&*host, other, regs)),
    }
    Ok(())
}
