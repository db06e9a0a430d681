//! Unconstrained function executor
//!
//! Runs read-only functions against a shared view of the execution
//! context. Notes (pending and committed) can be read, nothing can be
//! recorded, and node data is served by an optional [`AztecNode`] handle.

use crate::abi::{FunctionAbi, FunctionType};
use crate::bytecode::Instruction;
use crate::context::ExecutionContext;
use crate::errors::{PxeError, Result};
use crate::field::Fr;
use crate::input::CallContext;
use crate::oracle::SharedNode;
use crate::packed_args::compute_args_hash;
use crate::types::AztecAddress;
use crate::vm::{self, unsupported, Host, Registers};
use async_trait::async_trait;
use tracing::debug;

/// Run an unconstrained function and return its return values
///
/// Fails with `AbiKindMismatch` for anything but an unconstrained ABI.
/// Public storage reads go to `node`.
pub async fn execute_unconstrained(
    ctx: &ExecutionContext,
    abi: &FunctionAbi,
    call_context: CallContext,
    args: &[Fr],
    node: Option<SharedNode>,
) -> Result<Vec<Fr>> {
    if abi.function_type != FunctionType::Unconstrained {
        return Err(PxeError::AbiKindMismatch {
            function: abi.name.clone(),
            expected: FunctionType::Unconstrained,
            actual: abi.function_type,
        });
    }
    debug!(
        function = %abi.name,
        contract = %call_context.storage_contract_address,
        "executing unconstrained function"
    );
    let mut host = UnconstrainedHost {
        ctx,
        call_context,
        node,
    };
    vm::run(&mut host, &abi.bytecode, &abi.name, args).await
}

struct UnconstrainedHost<'a> {
    ctx: &'a ExecutionContext,
    call_context: CallContext,
    node: Option<SharedNode>,
}

#[async_trait]
impl Host for UnconstrainedHost<'_> {
    fn mode(&self) -> &'static str {
        "unconstrained"
    }

    fn context(&self) -> &ExecutionContext {
        self.ctx
    }

    fn call_context(&self) -> &CallContext {
        &self.call_context
    }

    async fn side_effect(&mut self, instruction: &Instruction, regs: &mut Registers) -> Result<()> {
        Err(unsupported(self, instruction, regs))
    }

    async fn node_query(&mut self, instruction: &Instruction, regs: &mut Registers) -> Result<()> {
        let node = self.node.clone();
        match instruction {
            Instruction::GetBlockHeight { dst } => {
                let node = node.ok_or(PxeError::MissingNodeHandle("block height"))?;
                let height = node.get_block_height().await;
                regs.set(*dst, Fr::from(height));
            }
            Instruction::GetPublicStorageAt {
                dst,
                contract,
                slot,
            } => {
                let node = node.ok_or(PxeError::MissingNodeHandle("public storage"))?;
                let value = node
                    .get_public_storage_at(AztecAddress(regs.get(*contract)?), regs.get(*slot)?)
                    .await;
                regs.set(*dst, value);
            }
            other => return Err(unsupported(self, other, regs)),
        }
        Ok(())
    }

    /// Nothing is called from unconstrained code, so the arguments are
    /// hashed but not stored
    fn pack_arguments(&mut self, args: Vec<Fr>) -> Fr {
        compute_args_hash(&args, self.ctx.backend())
    }
}
