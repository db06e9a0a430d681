//! Core type definitions
//!
//! Addresses, keys and selectors used across the engine. Everything that
//! crosses the oracle boundary is a field element or a fixed-width byte array.

pub use alloy_primitives::{Address, B256, U256};

use crate::field::Fr;
use crate::hashing::keccak256;
use core::fmt;
use serde::{Deserialize, Serialize};

/// 32-byte hash (Keccak256 output)
pub type Hash = B256;

/// Secret key tied to a note owner's public key.
pub type SecretKey = Fr;

/// Address of an L2 contract or account.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AztecAddress(pub Fr);

impl AztecAddress {
    pub const ZERO: AztecAddress = AztecAddress(Fr::ZERO);

    pub fn from_u64(value: u64) -> Self {
        Self(Fr::from(value))
    }

    pub fn to_field(&self) -> Fr {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for AztecAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for AztecAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AztecAddress({})", self.0)
    }
}

/// L1 portal contract address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EthAddress(pub Address);

impl EthAddress {
    pub const ZERO: EthAddress = EthAddress(Address::ZERO);

    pub fn to_field(&self) -> Fr {
        Fr::from_be_slice(self.0.as_slice())
    }

    pub fn is_zero(&self) -> bool {
        self.0 == Address::ZERO
    }
}

/// Grumpkin point identifying a note owner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PublicKey {
    pub x: Fr,
    pub y: Fr,
}

impl PublicKey {
    pub fn new(x: Fr, y: Fr) -> Self {
        Self { x, y }
    }
}

/// First four bytes of the keccak256 of a function signature.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FunctionSelector(pub [u8; 4]);

impl FunctionSelector {
    pub const EMPTY: FunctionSelector = FunctionSelector([0; 4]);

    /// Selector for a signature such as `transfer(field,field)`.
    pub fn from_signature(signature: &str) -> Self {
        let hash = keccak256(signature.as_bytes());
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&hash.as_slice()[..4]);
        Self(bytes)
    }

    pub fn to_field(&self) -> Fr {
        Fr::from_be_slice(&self.0)
    }

    /// Inverse of [`FunctionSelector::to_field`]; only the low four bytes are kept.
    pub fn from_field(value: Fr) -> Self {
        let bytes = value.to_be_bytes();
        let mut selector = [0u8; 4];
        selector.copy_from_slice(&bytes[28..]);
        Self(selector)
    }
}

impl fmt::Debug for FunctionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FunctionSelector(0x{})", hex::encode(self.0))
    }
}

impl fmt::Display for FunctionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_creation() {
        let addr = AztecAddress::from_u64(0x42);
        assert_eq!(addr.to_field(), Fr::from(0x42));
        assert!(AztecAddress::ZERO.is_zero());
    }

    #[test]
    fn test_eth_address_to_field() {
        let portal = EthAddress(Address::repeat_byte(0x01));
        let bytes = portal.to_field().to_be_bytes();
        assert_eq!(&bytes[..12], &[0u8; 12]);
        assert_eq!(&bytes[12..], &[0x01; 20]);
    }

    #[test]
    fn test_selector_round_trip() {
        let selector = FunctionSelector::from_signature("transfer(field,field)");
        assert_ne!(selector, FunctionSelector::EMPTY);
        assert_eq!(FunctionSelector::from_field(selector.to_field()), selector);
    }

    #[test]
    fn test_hash_zero() {
        let hash = Hash::ZERO;
        assert_eq!(hash.as_slice(), &[0u8; 32]);
    }
}
