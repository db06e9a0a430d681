//! Simulator entry points
//!
//! [`Simulator`] builds a fresh [`ExecutionContext`] per request and runs
//! the private or unconstrained executor on it. It also exposes the note
//! hash and nullifier derivation every note-holding contract implements
//! through its `compute_note_hash_and_nullifier` function.

use crate::abi::{FunctionAbi, FunctionType};
use crate::config::SimulatorConfig;
use crate::context::ExecutionContext;
use crate::errors::{PxeError, Result};
use crate::field::Fr;
use crate::hashing::Backend;
use crate::input::{CallContext, FunctionCall, HistoricBlockData, TxContext, TxExecutionRequest};
use crate::note_hash::NoteHashAndNullifier;
use crate::oracle::{SharedNode, SharedOracle};
use crate::output::ExecutionResult;
use crate::packed_args::PackedArgsCache;
use crate::private_execution::{execute_private, PrivateCall};
use crate::types::{AztecAddress, EthAddress, FunctionSelector};
use crate::unconstrained_execution::execute_unconstrained;
use std::sync::Arc;
use tracing::{debug, warn};

/// Signature every contract holding private notes must implement:
/// `(contract_address, nonce, storage_slot, preimage[N]) ->
/// [inner_note_hash, siloed_note_hash, unique_siloed_note_hash, inner_nullifier]`
pub const COMPUTE_NOTE_HASH_AND_NULLIFIER_SIGNATURE: &str =
    "compute_note_hash_and_nullifier(field,field,field,array)";

pub fn compute_note_hash_and_nullifier_selector() -> FunctionSelector {
    FunctionSelector::from_signature(COMPUTE_NOTE_HASH_AND_NULLIFIER_SIGNATURE)
}

/// Private and unconstrained function simulator
///
/// Holds the data oracle and circuits backend shared by every
/// simulation. Each call gets its own execution context, so independent
/// transactions can be simulated concurrently.
#[derive(Clone)]
pub struct Simulator {
    oracle: SharedOracle,
    backend: Backend,
    config: SimulatorConfig,
}

impl Simulator {
    /// Simulator with the default limits
    pub fn new(oracle: SharedOracle, backend: Backend) -> Self {
        Self {
            oracle,
            backend,
            config: SimulatorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SimulatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn oracle(&self) -> &SharedOracle {
        &self.oracle
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Simulate a private function and everything it calls
    ///
    /// The entrypoint runs with a zero `msg_sender`. A request whose
    /// origin differs from `contract_address` is simulated anyway; only a
    /// warning is logged.
    ///
    /// # Arguments
    /// * `request` - Entrypoint call and its packed arguments
    /// * `entry_abi` - ABI of the entrypoint; must be a secret function
    /// * `contract_address` - Contract whose function is run
    /// * `portal_contract_address` - Portal exposed in the call context
    /// * `historic_block_data` - Roots every read is checked against
    ///
    /// # Returns
    /// The root [`ExecutionResult`] with nested calls attached
    pub async fn run(
        &self,
        request: &TxExecutionRequest,
        entry_abi: &FunctionAbi,
        contract_address: AztecAddress,
        portal_contract_address: EthAddress,
        historic_block_data: HistoricBlockData,
    ) -> Result<ExecutionResult> {
        if entry_abi.function_type != FunctionType::Secret {
            return Err(PxeError::AbiKindMismatch {
                function: entry_abi.name.clone(),
                expected: FunctionType::Secret,
                actual: entry_abi.function_type,
            });
        }
        if request.origin != contract_address {
            warn!(
                origin = %request.origin,
                contract = %contract_address,
                "request origin does not match contract being called"
            );
        }

        let tx_nullifier = request.to_tx_request().hash(&self.backend);
        let mut ctx = ExecutionContext::new(
            self.oracle.clone(),
            self.backend.clone(),
            tx_nullifier,
            request.tx_context,
            Arc::new(historic_block_data),
            PackedArgsCache::with_initial(self.backend.clone(), &request.packed_arguments),
        )
        .with_config(self.config.clone());

        debug!(function = %entry_abi.name, %tx_nullifier, "executing simulator");
        let call = PrivateCall {
            abi: entry_abi.clone(),
            contract_address,
            function_data: request.function_data,
            call_context: CallContext::new(
                AztecAddress::ZERO,
                contract_address,
                portal_contract_address,
                request.function_data.is_constructor,
            ),
            args: ctx.unpack_args(request.args_hash)?,
        };
        let result = execute_private(&mut ctx, call, 0).await?;
        debug!(calls = result.call_count(), "simulation completed");
        Ok(result)
    }

    /// Simulate an unconstrained function and return its values
    ///
    /// Nothing is recorded and nothing is packed. `origin` is the
    /// `msg_sender` the function sees.
    #[allow(clippy::too_many_arguments)]
    pub async fn run_unconstrained(
        &self,
        call: &FunctionCall,
        origin: AztecAddress,
        entry_abi: &FunctionAbi,
        contract_address: AztecAddress,
        portal_contract_address: EthAddress,
        historic_block_data: HistoricBlockData,
        node: Option<SharedNode>,
    ) -> Result<Vec<Fr>> {
        if entry_abi.function_type != FunctionType::Unconstrained {
            return Err(PxeError::AbiKindMismatch {
                function: entry_abi.name.clone(),
                expected: FunctionType::Unconstrained,
                actual: entry_abi.function_type,
            });
        }
        let ctx = self.read_only_context(historic_block_data);
        let call_context = CallContext::new(origin, contract_address, portal_contract_address, false);
        execute_unconstrained(&ctx, entry_abi, call_context, &call.args, node).await
    }

    /// Derive a note's hashes and nullifier through the contract's own
    /// `compute_note_hash_and_nullifier`. The preimage is zero-padded to
    /// the array length that function declares.
    ///
    /// The call runs with a zero `msg_sender` and a zero portal.
    ///
    /// # Arguments
    /// * `contract_address` - Contract that owns the note
    /// * `nonce` - Note nonce, zero for a note not yet inserted
    /// * `storage_slot` - Slot the note lives in
    /// * `preimage` - Note fields, at most the declared array length
    ///
    /// # Returns
    /// The inner, siloed and unique note hashes plus the inner nullifier
    pub async fn compute_note_hash_and_nullifier(
        &self,
        contract_address: AztecAddress,
        nonce: Fr,
        storage_slot: Fr,
        preimage: &[Fr],
    ) -> Result<NoteHashAndNullifier> {
        let missing = || PxeError::MissingNoteHashImplementation {
            contract: contract_address,
            signature: COMPUTE_NOTE_HASH_AND_NULLIFIER_SIGNATURE,
        };
        let abi = self
            .oracle
            .get_function_abi(contract_address, compute_note_hash_and_nullifier_selector())
            .await
            .filter(|abi| abi.function_type == FunctionType::Unconstrained)
            .ok_or_else(missing)?;
        let preimage_len = abi
            .parameters
            .get(3)
            .and_then(|p| p.ty.array_length())
            .ok_or_else(missing)?;
        if preimage.len() > preimage_len {
            return Err(PxeError::PreimageTooLong {
                len: preimage.len(),
                max: preimage_len,
            });
        }

        let mut args = vec![contract_address.to_field(), nonce, storage_slot];
        args.extend_from_slice(preimage);
        args.resize(3 + preimage_len, Fr::ZERO);

        let ctx = self.read_only_context(HistoricBlockData::default());
        let call_context =
            CallContext::new(AztecAddress::ZERO, contract_address, EthAddress::ZERO, false);
        let values = execute_unconstrained(&ctx, &abi, call_context, &args, None).await?;
        match values[..] {
            [inner_note_hash, siloed_note_hash, unique_siloed_note_hash, inner_nullifier, ..] => {
                Ok(NoteHashAndNullifier {
                    inner_note_hash,
                    siloed_note_hash,
                    unique_siloed_note_hash,
                    inner_nullifier,
                })
            }
            _ => Err(missing()),
        }
    }

    /// Inner note hash as the contract computes it
    pub async fn compute_inner_note_hash(
        &self,
        contract_address: AztecAddress,
        storage_slot: Fr,
        preimage: &[Fr],
    ) -> Result<Fr> {
        let hashes = self
            .compute_note_hash_and_nullifier(contract_address, Fr::ZERO, storage_slot, preimage)
            .await?;
        Ok(hashes.inner_note_hash)
    }

    pub async fn compute_siloed_note_hash(
        &self,
        contract_address: AztecAddress,
        storage_slot: Fr,
        preimage: &[Fr],
    ) -> Result<Fr> {
        let hashes = self
            .compute_note_hash_and_nullifier(contract_address, Fr::ZERO, storage_slot, preimage)
            .await?;
        Ok(hashes.siloed_note_hash)
    }

    pub async fn compute_unique_siloed_note_hash(
        &self,
        contract_address: AztecAddress,
        nonce: Fr,
        storage_slot: Fr,
        preimage: &[Fr],
    ) -> Result<Fr> {
        let hashes = self
            .compute_note_hash_and_nullifier(contract_address, nonce, storage_slot, preimage)
            .await?;
        Ok(hashes.unique_siloed_note_hash)
    }

    pub async fn compute_inner_nullifier(
        &self,
        contract_address: AztecAddress,
        nonce: Fr,
        storage_slot: Fr,
        preimage: &[Fr],
    ) -> Result<Fr> {
        let hashes = self
            .compute_note_hash_and_nullifier(contract_address, nonce, storage_slot, preimage)
            .await?;
        Ok(hashes.inner_nullifier)
    }

    /// Context for unconstrained calls: no transaction, nothing packed
    fn read_only_context(&self, historic_block_data: HistoricBlockData) -> ExecutionContext {
        ExecutionContext::new(
            self.oracle.clone(),
            self.backend.clone(),
            Fr::ZERO,
            TxContext::default(),
            Arc::new(historic_block_data),
            PackedArgsCache::new(self.backend.clone()),
        )
        .with_config(self.config.clone())
    }
}
