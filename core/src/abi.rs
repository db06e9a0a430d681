//! Contract function ABIs
//!
//! A [`FunctionAbi`] describes one contract function: its kind (private,
//! public or unconstrained), typed parameters and the [`Program`] the
//! executors simulate. Arguments travel as flat field arrays; the typed
//! parameter list only determines how values are laid out.

use crate::bytecode::Program;
use crate::errors::{PxeError, Result};
use crate::field::Fr;
use crate::hashing::{Backend, GeneratorIndex};
use crate::types::FunctionSelector;
use serde::{Deserialize, Serialize};

/// Kind of a contract function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionType {
    /// Private function, simulated client-side and proven
    Secret,
    /// Public function, executed by the sequencer
    Open,
    /// Read-only function, simulated without recording side effects
    Unconstrained,
}

/// Parameter / return type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbiType {
    Field,
    Boolean,
    Integer { signed: bool, width: u32 },
    Array { length: usize, ty: Box<AbiType> },
    Struct { fields: Vec<AbiParameter> },
}

impl AbiType {
    /// Number of field elements a value of this type flattens to
    pub fn size(&self) -> usize {
        match self {
            AbiType::Field | AbiType::Boolean | AbiType::Integer { .. } => 1,
            AbiType::Array { length, ty } => length * ty.size(),
            AbiType::Struct { fields } => fields.iter().map(|f| f.ty.size()).sum(),
        }
    }

    /// Name used when building function signatures
    pub fn kind(&self) -> &'static str {
        match self {
            AbiType::Field => "field",
            AbiType::Boolean => "boolean",
            AbiType::Integer { .. } => "integer",
            AbiType::Array { .. } => "array",
            AbiType::Struct { .. } => "struct",
        }
    }

    /// Declared length when this is an array
    pub fn array_length(&self) -> Option<usize> {
        match self {
            AbiType::Array { length, .. } => Some(*length),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiParameter {
    pub name: String,
    pub ty: AbiType,
}

impl AbiParameter {
    pub fn new(name: impl Into<String>, ty: AbiType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    pub fn field(name: impl Into<String>) -> Self {
        Self::new(name, AbiType::Field)
    }
}

/// ABI of a single contract function, bytecode included
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionAbi {
    pub name: String,
    pub function_type: FunctionType,
    pub is_internal: bool,
    pub parameters: Vec<AbiParameter>,
    pub return_types: Vec<AbiType>,
    pub bytecode: Program,
}

impl FunctionAbi {
    pub fn new(
        name: impl Into<String>,
        function_type: FunctionType,
        parameters: Vec<AbiParameter>,
        bytecode: Program,
    ) -> Self {
        Self {
            name: name.into(),
            function_type,
            is_internal: false,
            parameters,
            return_types: Vec::new(),
            bytecode,
        }
    }

    /// Set the return types
    pub fn with_return_types(mut self, return_types: Vec<AbiType>) -> Self {
        self.return_types = return_types;
        self
    }

    /// `name(kind,kind,...)`
    pub fn signature(&self) -> String {
        let kinds: Vec<&str> = self.parameters.iter().map(|p| p.ty.kind()).collect();
        format!("{}({})", self.name, kinds.join(","))
    }

    pub fn selector(&self) -> FunctionSelector {
        FunctionSelector::from_signature(&self.signature())
    }

    pub fn is_constructor(&self) -> bool {
        self.name == "constructor"
    }

    /// Total number of fields the flattened arguments occupy
    pub fn parameter_size(&self) -> usize {
        self.parameters.iter().map(|p| p.ty.size()).sum()
    }
}

/// Function identity as it appears in requests and call stacks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionData {
    pub selector: FunctionSelector,
    pub is_internal: bool,
    pub is_private: bool,
    pub is_constructor: bool,
}

impl FunctionData {
    pub fn new(selector: FunctionSelector, is_private: bool, is_constructor: bool) -> Self {
        Self {
            selector,
            is_internal: false,
            is_private,
            is_constructor,
        }
    }

    pub fn from_abi(abi: &FunctionAbi) -> Self {
        Self {
            selector: abi.selector(),
            is_internal: abi.is_internal,
            is_private: abi.function_type == FunctionType::Secret,
            is_constructor: abi.is_constructor(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn hash(&self, backend: &Backend) -> Fr {
        backend.hash(
            GeneratorIndex::FunctionData,
            &[
                self.selector.to_field(),
                Fr::from(self.is_internal),
                Fr::from(self.is_private),
                Fr::from(self.is_constructor),
            ],
        )
    }
}

/// Typed argument value, flattened by [`encode_arguments`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbiValue {
    Field(Fr),
    Bool(bool),
    Integer(u64),
    Array(Vec<AbiValue>),
    Struct(Vec<AbiValue>),
}

impl From<Fr> for AbiValue {
    fn from(value: Fr) -> Self {
        AbiValue::Field(value)
    }
}

/// Flatten typed arguments into the field array a function receives.
///
/// Each value must match its parameter's type; arrays and structs
/// flatten in declaration order.
///
/// # Returns
/// The flattened fields, or `InvalidArguments` on any count or type
/// mismatch
pub fn encode_arguments(abi: &FunctionAbi, args: &[AbiValue]) -> Result<Vec<Fr>> {
    if args.len() != abi.parameters.len() {
        return Err(PxeError::InvalidArguments {
            function: abi.name.clone(),
            reason: format!("expected {} arguments, got {}", abi.parameters.len(), args.len()),
        });
    }
    let mut out = Vec::with_capacity(abi.parameter_size());
    for (param, value) in abi.parameters.iter().zip(args) {
        encode_value(&abi.name, &param.name, &param.ty, value, &mut out)?;
    }
    Ok(out)
}

fn encode_value(
    function: &str,
    param: &str,
    ty: &AbiType,
    value: &AbiValue,
    out: &mut Vec<Fr>,
) -> Result<()> {
    let mismatch = || PxeError::InvalidArguments {
        function: function.to_string(),
        reason: format!("value for {param} does not match type {}", ty.kind()),
    };
    match (ty, value) {
        (AbiType::Field, AbiValue::Field(v)) => out.push(*v),
        (AbiType::Field, AbiValue::Integer(v)) => out.push(Fr::from(*v)),
        (AbiType::Boolean, AbiValue::Bool(v)) => out.push(Fr::from(*v)),
        (AbiType::Integer { width, .. }, AbiValue::Integer(v)) => {
            if *width < 64 && *v >> width != 0 {
                return Err(mismatch());
            }
            out.push(Fr::from(*v));
        }
        (AbiType::Array { length, ty }, AbiValue::Array(items)) => {
            if items.len() != *length {
                return Err(mismatch());
            }
            for item in items {
                encode_value(function, param, ty, item, out)?;
            }
        }
        (AbiType::Struct { fields }, AbiValue::Struct(items)) => {
            if items.len() != fields.len() {
                return Err(mismatch());
            }
            for (field, item) in fields.iter().zip(items) {
                encode_value(function, &field.name, &field.ty, item, out)?;
            }
        }
        _ => return Err(mismatch()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::KeccakBackend;

    fn transfer_abi() -> FunctionAbi {
        FunctionAbi::new(
            "transfer",
            FunctionType::Secret,
            vec![
                AbiParameter::field("amount"),
                AbiParameter::new(
                    "owner",
                    AbiType::Struct {
                        fields: vec![AbiParameter::field("x"), AbiParameter::field("y")],
                    },
                ),
                AbiParameter::new(
                    "memo",
                    AbiType::Array {
                        length: 3,
                        ty: Box::new(AbiType::Field),
                    },
                ),
            ],
            Program::default(),
        )
    }

    #[test]
    fn test_signature_and_selector() {
        let abi = transfer_abi();
        assert_eq!(abi.signature(), "transfer(field,struct,array)");
        assert_eq!(
            abi.selector(),
            FunctionSelector::from_signature("transfer(field,struct,array)")
        );
        assert_eq!(abi.parameter_size(), 6);
    }

    #[test]
    fn test_encode_arguments_flattens() {
        let abi = transfer_abi();
        let encoded = encode_arguments(
            &abi,
            &[
                AbiValue::Integer(10),
                AbiValue::Struct(vec![Fr::from(1).into(), Fr::from(2).into()]),
                AbiValue::Array(vec![AbiValue::Integer(7); 3]),
            ],
        )
        .unwrap();
        let expected: Vec<Fr> = [10, 1, 2, 7, 7, 7].into_iter().map(Fr::from).collect();
        assert_eq!(encoded, expected);
    }

    #[test]
    fn test_encode_arguments_rejects_bad_shapes() {
        let abi = transfer_abi();
        assert!(encode_arguments(&abi, &[AbiValue::Integer(10)]).is_err());
        let err = encode_arguments(
            &abi,
            &[
                AbiValue::Integer(10),
                AbiValue::Struct(vec![Fr::from(1).into()]),
                AbiValue::Array(vec![AbiValue::Integer(7); 3]),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, PxeError::InvalidArguments { .. }));
    }

    #[test]
    fn test_integer_width_checked() {
        let abi = FunctionAbi::new(
            "set",
            FunctionType::Secret,
            vec![AbiParameter::new(
                "value",
                AbiType::Integer {
                    signed: false,
                    width: 8,
                },
            )],
            Program::default(),
        );
        assert!(encode_arguments(&abi, &[AbiValue::Integer(255)]).is_ok());
        assert!(encode_arguments(&abi, &[AbiValue::Integer(256)]).is_err());
    }

    #[test]
    fn test_function_data_from_abi() {
        let abi = transfer_abi();
        let data = FunctionData::from_abi(&abi);
        assert!(data.is_private);
        assert!(!data.is_constructor);
        let backend = KeccakBackend::shared();
        assert_ne!(data.hash(&backend), FunctionData::empty().hash(&backend));
    }
}
