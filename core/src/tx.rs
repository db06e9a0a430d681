//! Broadcastable transactions
//!
//! A [`Tx`] bundles the kernel's public inputs, the proof, both log sets,
//! the public bytecode of a newly deployed contract and the preimages of
//! every enqueued public call. Construction checks that the bundle is
//! internally consistent.

use crate::abi::{FunctionAbi, FunctionType};
use crate::errors::{PxeError, Result};
use crate::field::Fr;
use crate::kernel::{KernelPublicInputs, Proof};
use crate::output::{PublicCallRequest, TxL2Logs};
use crate::types::{AztecAddress, EthAddress, FunctionSelector};
use serde::{Deserialize, Serialize};

/// Public function of a newly deployed contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedContractFunction {
    pub selector: FunctionSelector,
    pub is_internal: bool,
    /// bincode-encoded program
    pub bytecode: Vec<u8>,
}

impl EncodedContractFunction {
    pub fn from_abi(abi: &FunctionAbi) -> Result<Self> {
        Ok(Self {
            selector: abi.selector(),
            is_internal: abi.is_internal,
            bytecode: abi.bytecode.to_bytes()?,
        })
    }
}

/// A contract as known to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractDao {
    pub name: String,
    pub address: AztecAddress,
    pub portal_contract_address: EthAddress,
    pub functions: Vec<FunctionAbi>,
    pub deployed: bool,
}

impl ContractDao {
    pub fn new(name: impl Into<String>, address: AztecAddress, functions: Vec<FunctionAbi>) -> Self {
        Self {
            name: name.into(),
            address,
            portal_contract_address: EthAddress::ZERO,
            functions,
            deployed: false,
        }
    }

    pub fn with_portal(mut self, portal: EthAddress) -> Self {
        self.portal_contract_address = portal;
        self
    }

    pub fn function(&self, selector: FunctionSelector) -> Option<&FunctionAbi> {
        self.functions.iter().find(|f| f.selector() == selector)
    }

    /// Public functions, encoded for publication
    pub fn public_functions(&self) -> Result<Vec<EncodedContractFunction>> {
        self.functions
            .iter()
            .filter(|f| f.function_type == FunctionType::Open)
            .map(EncodedContractFunction::from_abi)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tx {
    pub data: KernelPublicInputs,
    pub proof: Proof,
    pub encrypted_logs: TxL2Logs,
    pub unencrypted_logs: TxL2Logs,
    pub new_contract_public_functions: Vec<EncodedContractFunction>,
    pub enqueued_public_functions: Vec<PublicCallRequest>,
}

impl Tx {
    /// Assemble a transaction.
    ///
    /// Fails when there are fewer unencrypted than encrypted function log
    /// entries, or when the kernel's public call stack references more
    /// calls than there are preimages.
    pub fn new(
        data: KernelPublicInputs,
        proof: Proof,
        encrypted_logs: TxL2Logs,
        unencrypted_logs: TxL2Logs,
        new_contract_public_functions: Vec<EncodedContractFunction>,
        enqueued_public_functions: Vec<PublicCallRequest>,
    ) -> Result<Self> {
        if unencrypted_logs.function_count() < encrypted_logs.function_count() {
            return Err(PxeError::InconsistentLogCount {
                encrypted: encrypted_logs.function_count(),
                unencrypted: unencrypted_logs.function_count(),
            });
        }
        let expected = data.end.public_call_stack.non_empty_len();
        if enqueued_public_functions.len() < expected {
            return Err(PxeError::MissingPublicCallPreimage {
                expected,
                actual: enqueued_public_functions.len(),
            });
        }
        Ok(Self {
            data,
            proof,
            encrypted_logs,
            unencrypted_logs,
            new_contract_public_functions,
            enqueued_public_functions,
        })
    }

    /// The transaction hash is its first nullifier
    pub fn tx_hash(&self) -> Result<Fr> {
        self.data
            .end
            .new_nullifiers
            .get(0)
            .copied()
            .ok_or(PxeError::MissingTxHash)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::AbiParameter;
    use crate::bytecode::Program;
    use crate::input::{HistoricBlockData, TxContext};
    use crate::kernel::{CombinedAccumulatedData, CombinedConstantData};
    use crate::output::FunctionL2Logs;
    use crate::squash::PaddedArray;
    use crate::types::Hash;

    fn public_inputs(nullifiers: &[u64], calls: &[u64]) -> KernelPublicInputs {
        let mut new_nullifiers = PaddedArray::new(4);
        for n in nullifiers {
            new_nullifiers.push(Fr::from(*n), "nullifiers").unwrap();
        }
        let mut public_call_stack = PaddedArray::new(4);
        for c in calls {
            public_call_stack.push(Fr::from(*c), "public calls").unwrap();
        }
        KernelPublicInputs {
            end: CombinedAccumulatedData {
                new_commitments: PaddedArray::new(4),
                new_nullifiers,
                public_call_stack,
                encrypted_logs_hash: Hash::ZERO,
                unencrypted_logs_hash: Hash::ZERO,
                encrypted_log_preimages_length: 0,
                unencrypted_log_preimages_length: 0,
            },
            constants: CombinedConstantData {
                historic_block_data: HistoricBlockData::default(),
                tx_context: TxContext::default(),
            },
            is_private: true,
        }
    }

    fn logs(functions: usize) -> TxL2Logs {
        TxL2Logs::new(vec![FunctionL2Logs::default(); functions])
    }

    #[test]
    fn test_tx_hash_is_first_nullifier() {
        let tx = Tx::new(public_inputs(&[42, 7], &[]), Proof::new(vec![1]), logs(1), logs(1), vec![], vec![])
            .unwrap();
        assert_eq!(tx.tx_hash().unwrap(), Fr::from(42));

        let empty = Tx::new(public_inputs(&[], &[]), Proof::new(vec![]), logs(0), logs(0), vec![], vec![])
            .unwrap();
        assert!(matches!(empty.tx_hash(), Err(PxeError::MissingTxHash)));
    }

    #[test]
    fn test_log_count_validation() {
        let err = Tx::new(public_inputs(&[1], &[]), Proof::new(vec![]), logs(2), logs(1), vec![], vec![])
            .unwrap_err();
        assert!(matches!(err, PxeError::InconsistentLogCount { encrypted: 2, unencrypted: 1 }));
        assert!(Tx::new(public_inputs(&[1], &[]), Proof::new(vec![]), logs(1), logs(2), vec![], vec![]).is_ok());
    }

    #[test]
    fn test_public_call_preimages_required() {
        let err = Tx::new(public_inputs(&[1], &[5]), Proof::new(vec![]), logs(1), logs(1), vec![], vec![])
            .unwrap_err();
        assert!(matches!(err, PxeError::MissingPublicCallPreimage { expected: 1, actual: 0 }));
    }

    #[test]
    fn test_serialization_formats() {
        let tx = Tx::new(public_inputs(&[3], &[]), Proof::new(vec![9, 9]), logs(1), logs(1), vec![], vec![])
            .unwrap();
        assert_eq!(Tx::from_bytes(&tx.to_bytes().unwrap()).unwrap(), tx);
        assert_eq!(Tx::from_json(&tx.to_json().unwrap()).unwrap(), tx);
        assert!(Tx::from_json("{}").is_err());
    }

    #[test]
    fn test_contract_public_functions() {
        let open = FunctionAbi::new("update", FunctionType::Open, vec![AbiParameter::field("v")], Program::default());
        let secret = FunctionAbi::new("transfer", FunctionType::Secret, vec![], Program::default());
        let dao = ContractDao::new("Token", AztecAddress::from_u64(3), vec![open.clone(), secret.clone()]);

        let public = dao.public_functions().unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].selector, open.selector());
        assert_eq!(dao.function(secret.selector()), Some(&secret));
    }
}
