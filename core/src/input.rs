//! Request types for private execution
//!
//! Everything the engine receives from its caller: the signed transaction
//! request with its packed arguments, the transaction context, the call
//! context built for each frame, and the historic block data snapshot the
//! transaction is simulated against.
//!
//! The hash of a [`TxRequest`] is the transaction nullifier seed: it
//! namespaces the nonce of every note created in the transaction.

use crate::abi::FunctionData;
use crate::field::Fr;
use crate::hashing::{Backend, GeneratorIndex};
use crate::packed_args::PackedArguments;
use crate::types::{AztecAddress, EthAddress, PublicKey};
use serde::{Deserialize, Serialize};

/// Deployment parameters carried by a contract deployment transaction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractDeploymentData {
    pub deployer_public_key: PublicKey,
    pub constructor_vk_hash: Fr,
    pub function_tree_root: Fr,
    pub contract_address_salt: Fr,
    pub portal_contract_address: EthAddress,
}

impl ContractDeploymentData {
    fn fields(&self) -> [Fr; 6] {
        [
            self.deployer_public_key.x,
            self.deployer_public_key.y,
            self.constructor_vk_hash,
            self.function_tree_root,
            self.contract_address_salt,
            self.portal_contract_address.to_field(),
        ]
    }
}

/// Transaction-wide context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxContext {
    pub is_fee_payment_tx: bool,
    pub is_rebate_payment_tx: bool,
    pub is_contract_deployment_tx: bool,
    pub contract_deployment_data: ContractDeploymentData,
    /// Rollup chain id
    pub chain_id: Fr,
    /// Rollup protocol version
    pub version: Fr,
}

impl Default for TxContext {
    fn default() -> Self {
        Self {
            is_fee_payment_tx: false,
            is_rebate_payment_tx: false,
            is_contract_deployment_tx: false,
            contract_deployment_data: ContractDeploymentData::default(),
            chain_id: Fr::ONE,
            version: Fr::ONE,
        }
    }
}

impl TxContext {
    pub fn new(chain_id: Fr, version: Fr) -> Self {
        Self {
            chain_id,
            version,
            ..Default::default()
        }
    }

    /// Mark this as a deployment transaction
    pub fn with_contract_deployment(mut self, data: ContractDeploymentData) -> Self {
        self.is_contract_deployment_tx = true;
        self.contract_deployment_data = data;
        self
    }

    pub fn hash(&self, backend: &Backend) -> Fr {
        let mut inputs = vec![
            Fr::from(self.is_fee_payment_tx),
            Fr::from(self.is_rebate_payment_tx),
            Fr::from(self.is_contract_deployment_tx),
        ];
        inputs.extend(self.contract_deployment_data.fields());
        inputs.push(self.chain_id);
        inputs.push(self.version);
        backend.hash(GeneratorIndex::TxContext, &inputs)
    }
}

/// The signed part of a transaction request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRequest {
    /// Account contract the transaction originates from
    pub origin: AztecAddress,
    pub function_data: FunctionData,
    /// Hash of the entrypoint's flattened arguments
    pub args_hash: Fr,
    pub tx_context: TxContext,
}

impl TxRequest {
    /// Request hash, used as the transaction nullifier seed
    pub fn hash(&self, backend: &Backend) -> Fr {
        backend.hash(
            GeneratorIndex::TxRequest,
            &[
                self.origin.to_field(),
                self.function_data.hash(backend),
                self.args_hash,
                self.tx_context.hash(backend),
            ],
        )
    }
}

/// A transaction request together with the preimages of every argument
/// hash it references
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxExecutionRequest {
    pub origin: AztecAddress,
    pub function_data: FunctionData,
    pub args_hash: Fr,
    pub tx_context: TxContext,
    pub packed_arguments: Vec<PackedArguments>,
}

impl TxExecutionRequest {
    /// Build a request whose entrypoint arguments are packed on the spot
    pub fn new(
        origin: AztecAddress,
        function_data: FunctionData,
        args: Vec<Fr>,
        tx_context: TxContext,
        backend: &Backend,
    ) -> Self {
        let packed = PackedArguments::from_args(args, backend);
        Self {
            origin,
            function_data,
            args_hash: packed.hash,
            tx_context,
            packed_arguments: vec![packed],
        }
    }

    /// Add preimages for argument hashes used by nested calls
    pub fn with_packed_arguments(mut self, packed: Vec<PackedArguments>) -> Self {
        self.packed_arguments.extend(packed);
        self
    }

    pub fn to_tx_request(&self) -> TxRequest {
        TxRequest {
            origin: self.origin,
            function_data: self.function_data,
            args_hash: self.args_hash,
            tx_context: self.tx_context,
        }
    }
}

/// A call to an unconstrained (view) function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub to: AztecAddress,
    pub function_data: FunctionData,
    pub args: Vec<Fr>,
}

impl FunctionCall {
    pub fn new(to: AztecAddress, function_data: FunctionData, args: Vec<Fr>) -> Self {
        Self {
            to,
            function_data,
            args,
        }
    }
}

/// Per-frame call context
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    /// Zero for the entrypoint
    pub msg_sender: AztecAddress,
    pub storage_contract_address: AztecAddress,
    pub portal_contract_address: EthAddress,
    pub is_delegate_call: bool,
    pub is_static_call: bool,
    pub is_contract_deployment: bool,
}

impl CallContext {
    pub fn new(
        msg_sender: AztecAddress,
        storage_contract_address: AztecAddress,
        portal_contract_address: EthAddress,
        is_contract_deployment: bool,
    ) -> Self {
        Self {
            msg_sender,
            storage_contract_address,
            portal_contract_address,
            is_delegate_call: false,
            is_static_call: false,
            is_contract_deployment,
        }
    }

    pub fn hash(&self, backend: &Backend) -> Fr {
        backend.hash(
            GeneratorIndex::CallContext,
            &[
                self.msg_sender.to_field(),
                self.storage_contract_address.to_field(),
                self.portal_contract_address.to_field(),
                Fr::from(self.is_delegate_call),
                Fr::from(self.is_static_call),
                Fr::from(self.is_contract_deployment),
            ],
        )
    }
}

/// Names the roots of a [`HistoricBlockData`] snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoricRoot {
    PrivateData,
    Nullifier,
    Contract,
    L1ToL2Messages,
    Blocks,
    PrivateKernelVk,
    PublicData,
    GlobalVariablesHash,
}

/// Tree roots as of the block a transaction is built against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricBlockData {
    pub private_data_tree_root: Fr,
    pub nullifier_tree_root: Fr,
    pub contract_tree_root: Fr,
    pub l1_to_l2_messages_tree_root: Fr,
    pub blocks_tree_root: Fr,
    pub private_kernel_vk_tree_root: Fr,
    pub public_data_tree_root: Fr,
    pub global_variables_hash: Fr,
}

impl HistoricBlockData {
    pub fn root(&self, which: HistoricRoot) -> Fr {
        match which {
            HistoricRoot::PrivateData => self.private_data_tree_root,
            HistoricRoot::Nullifier => self.nullifier_tree_root,
            HistoricRoot::Contract => self.contract_tree_root,
            HistoricRoot::L1ToL2Messages => self.l1_to_l2_messages_tree_root,
            HistoricRoot::Blocks => self.blocks_tree_root,
            HistoricRoot::PrivateKernelVk => self.private_kernel_vk_tree_root,
            HistoricRoot::PublicData => self.public_data_tree_root,
            HistoricRoot::GlobalVariablesHash => self.global_variables_hash,
        }
    }

    /// Hash of the block these roots belong to. The blocks tree root and
    /// the kernel vk root are not part of the block hash.
    pub fn block_hash(&self, backend: &Backend) -> Fr {
        backend.hash(
            GeneratorIndex::BlockHash,
            &[
                self.global_variables_hash,
                self.private_data_tree_root,
                self.nullifier_tree_root,
                self.contract_tree_root,
                self.l1_to_l2_messages_tree_root,
                self.public_data_tree_root,
            ],
        )
    }
}
