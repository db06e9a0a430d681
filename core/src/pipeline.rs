//! Transaction construction pipeline
//!
//! `simulate -> squash -> prove -> assemble`. [`TxBuilder`] resolves the
//! entrypoint from the request's origin, runs the private simulation,
//! squashes transient notes, hands the trace to the kernel prover and
//! assembles the resulting [`Tx`].

use crate::errors::{OracleLookup, PxeError, Result};
use crate::field::Fr;
use crate::input::{FunctionCall, HistoricBlockData, TxExecutionRequest};
use crate::kernel::{KernelProver, TxTrace};
use crate::oracle::SharedNode;
use crate::output::{collect_encrypted_logs, collect_enqueued_public_function_calls, collect_unencrypted_logs};
use crate::simulator::Simulator;
use crate::squash::squash;
use crate::tx::{ContractDao, Tx};
use crate::types::{AztecAddress, EthAddress};
use std::sync::Arc;
use tracing::info;

/// Turns execution requests into proved transactions
///
/// Owns a [`Simulator`] and the kernel prover it hands traces to. The
/// builder keeps no per-transaction state, so one instance serves any
/// number of requests.
pub struct TxBuilder {
    simulator: Simulator,
    prover: Arc<dyn KernelProver>,
}

impl TxBuilder {
    pub fn new(simulator: Simulator, prover: Arc<dyn KernelProver>) -> Self {
        Self { simulator, prover }
    }

    pub fn simulator(&self) -> &Simulator {
        &self.simulator
    }

    /// Simulate `request`, prove it and assemble a transaction.
    ///
    /// `new_contract` is the contract being deployed by this transaction,
    /// if any; its public functions ship with the transaction.
    ///
    /// # Arguments
    /// * `request` - Private entrypoint call, with its packed arguments
    /// * `historic_block_data` - Roots the simulation reads against
    /// * `new_contract` - Contract deployed by this transaction
    ///
    /// # Returns
    /// The assembled transaction, or the first simulation, squash or
    /// proving error
    pub async fn build(
        &self,
        request: &TxExecutionRequest,
        historic_block_data: HistoricBlockData,
        new_contract: Option<&ContractDao>,
    ) -> Result<Tx> {
        if !request.function_data.is_private {
            return Err(PxeError::PublicEntrypoint);
        }
        let contract = request.origin;
        let selector = request.function_data.selector;
        let oracle = self.simulator.oracle();
        let entry_abi = oracle
            .get_function_abi(contract, selector)
            .await
            .ok_or(PxeError::OracleLookupFailed(OracleLookup::FunctionAbi {
                contract,
                selector,
            }))?;
        let portal = portal_of(self, contract).await?;

        let execution = self
            .simulator
            .run(request, &entry_abi, contract, portal, historic_block_data)
            .await?;

        let tx_request = request.to_tx_request();
        let tx_nullifier = tx_request.hash(self.simulator.backend());
        let side_effects = squash(&execution, tx_nullifier, self.simulator.config())?;
        let enqueued = collect_enqueued_public_function_calls(&execution);
        let trace = TxTrace {
            request: tx_request,
            encrypted_logs: collect_encrypted_logs(&execution),
            unencrypted_logs: collect_unencrypted_logs(&execution),
            execution,
            side_effects,
            historic_block_data,
        };

        let (public_inputs, proof) = self.prover.prove(&trace).await?;
        let new_contract_public_functions = match new_contract {
            Some(contract) => contract.public_functions()?,
            None => Vec::new(),
        };
        let tx = Tx::new(
            public_inputs,
            proof,
            trace.encrypted_logs,
            trace.unencrypted_logs,
            new_contract_public_functions,
            enqueued,
        )?;
        let tx_hash = tx.tx_hash()?;
        info!(
            %tx_hash,
            prover = self.prover.prover_id(),
            "transaction simulated and proved"
        );
        Ok(tx)
    }

    /// Run an unconstrained function and return its values
    ///
    /// `from` becomes the `msg_sender` of the call. A `node` is only
    /// needed when the function reads public storage.
    pub async fn view(
        &self,
        call: &FunctionCall,
        from: Option<AztecAddress>,
        historic_block_data: HistoricBlockData,
        node: Option<SharedNode>,
    ) -> Result<Vec<Fr>> {
        let contract = call.to;
        let selector = call.function_data.selector;
        let abi = self
            .simulator
            .oracle()
            .get_function_abi(contract, selector)
            .await
            .ok_or(PxeError::OracleLookupFailed(OracleLookup::FunctionAbi {
                contract,
                selector,
            }))?;
        let portal = portal_of(self, contract).await?;
        self.simulator
            .run_unconstrained(
                call,
                from.unwrap_or(AztecAddress::ZERO),
                &abi,
                contract,
                portal,
                historic_block_data,
                node,
            )
            .await
    }
}

async fn portal_of(builder: &TxBuilder, contract: AztecAddress) -> Result<EthAddress> {
    builder
        .simulator
        .oracle()
        .get_portal_contract_address(contract)
        .await
        .ok_or(PxeError::OracleLookupFailed(
            OracleLookup::PortalContractAddress(contract),
        ))
}
