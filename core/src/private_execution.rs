//! Private function executor
//!
//! Simulates a private function and, through it, every private function
//! it calls. All frames share one [`ExecutionContext`], so a note created
//! by a callee is visible to the caller's later reads. A nested call runs
//! to completion before its parent resumes.

use crate::abi::{FunctionAbi, FunctionData, FunctionType};
use crate::bytecode::Instruction;
use crate::context::ExecutionContext;
use crate::errors::{PxeError, Result};
use crate::field::Fr;
use crate::input::CallContext;
use crate::note_hash::derive_note_hashes;
use crate::output::{
    ExecutionResult, FunctionL2Logs, NewCommitment, NewNullifier, PublicCallRequest, ReadRequest,
};
use crate::types::AztecAddress;
use crate::vm::{self, unsupported, Host, Registers};
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use tracing::debug;

/// A private function invocation ready to run
#[derive(Debug, Clone)]
pub struct PrivateCall {
    pub abi: FunctionAbi,
    pub contract_address: AztecAddress,
    pub function_data: FunctionData,
    pub call_context: CallContext,
    pub args: Vec<Fr>,
}

/// Run `call` at nesting depth `depth` (0 for the entrypoint)
///
/// Nested private calls recurse through this function with the same
/// `ctx`, so side-effect counters and pending notes span the whole tree.
///
/// # Returns
/// The call's [`ExecutionResult`], or the first error anywhere below it
pub fn execute_private<'a>(
    ctx: &'a mut ExecutionContext,
    call: PrivateCall,
    depth: usize,
) -> BoxFuture<'a, Result<ExecutionResult>> {
    async move {
        if call.abi.function_type != FunctionType::Secret {
            return Err(PxeError::AbiKindMismatch {
                function: call.abi.name.clone(),
                expected: FunctionType::Secret,
                actual: call.abi.function_type,
            });
        }
        let max_depth = ctx.config().max_call_depth;
        if depth >= max_depth {
            return Err(PxeError::CallDepthExceeded(max_depth));
        }
        debug!(
            function = %call.abi.name,
            contract = %call.contract_address,
            depth,
            "executing private function"
        );

        let mut host = PrivateHost::new(ctx, call.call_context, call.contract_address, depth);
        let return_values = vm::run(&mut host, &call.abi.bytecode, &call.abi.name, &call.args).await?;

        Ok(ExecutionResult {
            function_name: call.abi.name,
            contract_address: call.contract_address,
            function_data: call.function_data,
            call_context: call.call_context,
            args: call.args,
            return_values,
            new_commitments: host.new_commitments,
            new_nullifiers: host.new_nullifiers,
            read_requests: host.read_requests,
            enqueued_public_calls: host.enqueued_public_calls,
            encrypted_logs: host.encrypted_logs,
            unencrypted_logs: host.unencrypted_logs,
            nested: host.nested,
        })
    }
    .boxed()
}

/// Records side effects of one private frame
struct PrivateHost<'a> {
    ctx: &'a mut ExecutionContext,
    call_context: CallContext,
    contract_address: AztecAddress,
    depth: usize,
    new_commitments: Vec<NewCommitment>,
    new_nullifiers: Vec<NewNullifier>,
    read_requests: Vec<ReadRequest>,
    enqueued_public_calls: Vec<PublicCallRequest>,
    encrypted_logs: FunctionL2Logs,
    unencrypted_logs: FunctionL2Logs,
    nested: Vec<ExecutionResult>,
}

impl<'a> PrivateHost<'a> {
    fn new(
        ctx: &'a mut ExecutionContext,
        call_context: CallContext,
        contract_address: AztecAddress,
        depth: usize,
    ) -> Self {
        Self {
            ctx,
            call_context,
            contract_address,
            depth,
            new_commitments: Vec::new(),
            new_nullifiers: Vec::new(),
            read_requests: Vec::new(),
            enqueued_public_calls: Vec::new(),
            encrypted_logs: FunctionL2Logs::default(),
            unencrypted_logs: FunctionL2Logs::default(),
            nested: Vec::new(),
        }
    }

    async fn call_private_function(
        &mut self,
        target: AztecAddress,
        selector: crate::types::FunctionSelector,
        args_hash: Fr,
    ) -> Result<ExecutionResult> {
        let args = self.ctx.unpack_args(args_hash)?;
        let abi = self.ctx.get_function_abi(target, selector).await?;
        let portal = self.ctx.get_portal_contract_address(target).await?;
        debug!(from = %self.contract_address, to = %target, function = %abi.name, "nested private call");
        let call = PrivateCall {
            function_data: FunctionData::from_abi(&abi),
            abi,
            contract_address: target,
            call_context: CallContext::new(self.contract_address, target, portal, false),
            args,
        };
        execute_private(&mut *self.ctx, call, self.depth + 1).await
    }
}

#[async_trait]
impl Host for PrivateHost<'_> {
    fn mode(&self) -> &'static str {
        "private"
    }

    fn context(&self) -> &ExecutionContext {
        &*self.ctx
    }

    fn call_context(&self) -> &CallContext {
        &self.call_context
    }

    async fn side_effect(&mut self, instruction: &Instruction, regs: &mut Registers) -> Result<()> {
        let contract = self.contract_address;
        match instruction {
            Instruction::CreateNote { slot, preimage } => {
                let slot = regs.get(*slot)?;
                let preimage = regs.read(*preimage)?;
                let counter = self.ctx.next_side_effect_counter();
                let note = self.ctx.insert_note(contract, slot, preimage);
                self.new_commitments.push(NewCommitment {
                    contract_address: contract,
                    storage_slot: slot,
                    nonce: note.nonce,
                    inner_note_hash: note.inner_note_hash,
                    value: note.unique_siloed_note_hash,
                    counter,
                });
            }
            Instruction::NullifyNote {
                slot,
                nonce,
                preimage,
                secret,
            } => {
                let hashes = derive_note_hashes(
                    self.ctx.backend(),
                    contract,
                    regs.get(*nonce)?,
                    regs.get(*slot)?,
                    &regs.read(*preimage)?,
                    regs.get(*secret)?,
                );
                let counter = self.ctx.next_side_effect_counter();
                self.new_nullifiers.push(NewNullifier {
                    value: hashes.inner_nullifier,
                    nullified_commitment: Some(hashes.unique_siloed_note_hash),
                    counter,
                });
            }
            Instruction::EmitNullifier { nullifier } => {
                let value = regs.get(*nullifier)?;
                let counter = self.ctx.next_side_effect_counter();
                self.new_nullifiers.push(NewNullifier {
                    value,
                    nullified_commitment: None,
                    counter,
                });
            }
            Instruction::CallPrivateFunction {
                target,
                selector,
                args_hash,
                dst,
                return_len,
            } => {
                let return_len = vm::operand_len(&*self.ctx, regs, "return_len", *return_len)?;
                let target = AztecAddress(regs.get(*target)?);
                let args_hash = regs.get(*args_hash)?;
                let result = self.call_private_function(target, *selector, args_hash).await?;
                regs.write_padded(*dst, &result.return_values, return_len)?;
                self.nested.push(result);
            }
            Instruction::EnqueuePublicFunctionCall {
                target,
                selector,
                args_hash,
            } => {
                let target = AztecAddress(regs.get(*target)?);
                let args = self.ctx.unpack_args(regs.get(*args_hash)?)?;
                let portal = self.ctx.get_portal_contract_address(target).await?;
                let counter = self.ctx.next_side_effect_counter();
                debug!(from = %contract, to = %target, %selector, "enqueuing public call");
                self.enqueued_public_calls.push(PublicCallRequest {
                    contract_address: target,
                    function_data: FunctionData::new(*selector, false, false),
                    call_context: CallContext::new(contract, target, portal, false),
                    args,
                    counter,
                });
            }
            Instruction::EmitEncryptedLog { payload } => {
                self.encrypted_logs.push_fields(&regs.read(*payload)?);
            }
            Instruction::EmitUnencryptedLog { payload } => {
                self.unencrypted_logs.push_fields(&regs.read(*payload)?);
            }
            other => return Err(unsupported(self, other, regs)),
        }
        Ok(())
    }

    async fn node_query(&mut self, instruction: &Instruction, regs: &mut Registers) -> Result<()> {
        Err(unsupported(self, instruction, regs))
    }

    fn pack_arguments(&mut self, args: Vec<Fr>) -> Fr {
        self.ctx.pack_args(args)
    }

    fn record_read(&mut self, request: ReadRequest) {
        self.read_requests.push(request);
    }
}
