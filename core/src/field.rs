//! Prime field element
//!
//! Every value the engine touches (note preimages, hashes, addresses, call
//! arguments) is an element of the BN254 scalar field, the field the proving
//! circuits are defined over. Arithmetic wraps modulo the field order.

use crate::types::U256;
use core::fmt;
use core::ops::{Add, Mul, Neg, Sub};
use serde::{Deserialize, Serialize};

/// Order of the BN254 scalar field.
pub const MODULUS: U256 = U256::from_limbs([
    0x43e1_f593_f000_0001,
    0x2833_e848_79b9_7091,
    0xb850_45b6_8181_585d,
    0x3064_4e72_e131_a029,
]);

/// Element of the BN254 scalar field, always kept in canonical (reduced) form.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Fr(U256);

impl Fr {
    pub const ZERO: Fr = Fr(U256::ZERO);
    pub const ONE: Fr = Fr(U256::from_limbs([1, 0, 0, 0]));

    /// Reduce an arbitrary 256-bit integer into the field.
    pub fn new(value: U256) -> Self {
        Self(value.reduce_mod(MODULUS))
    }

    /// Interpret 32 big-endian bytes as an integer and reduce it.
    pub fn from_be_bytes_mod_order(bytes: [u8; 32]) -> Self {
        Self::new(U256::from_be_bytes(bytes))
    }

    /// Big-endian slice of at most 32 bytes, left-padded with zeros.
    pub fn from_be_slice(bytes: &[u8]) -> Self {
        let mut buf = [0u8; 32];
        let len = bytes.len().min(32);
        buf[32 - len..].copy_from_slice(&bytes[bytes.len() - len..]);
        Self::from_be_bytes_mod_order(buf)
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        self.0.to_be_bytes::<32>()
    }

    pub fn as_u256(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Small values only; `None` when the element does not fit in a `u64`.
    pub fn to_u64(&self) -> Option<u64> {
        let limbs = self.0.as_limbs();
        if limbs[1..].iter().all(|l| *l == 0) {
            Some(limbs[0])
        } else {
            None
        }
    }
}

impl From<u64> for Fr {
    fn from(value: u64) -> Self {
        Self::new(U256::from(value))
    }
}

impl From<bool> for Fr {
    fn from(value: bool) -> Self {
        if value {
            Fr::ONE
        } else {
            Fr::ZERO
        }
    }
}

impl Add for Fr {
    type Output = Fr;

    fn add(self, rhs: Fr) -> Fr {
        Fr(self.0.add_mod(rhs.0, MODULUS))
    }
}

impl Neg for Fr {
    type Output = Fr;

    fn neg(self) -> Fr {
        if self.is_zero() {
            self
        } else {
            Fr(MODULUS - self.0)
        }
    }
}

impl Sub for Fr {
    type Output = Fr;

    fn sub(self, rhs: Fr) -> Fr {
        self + (-rhs)
    }
}

impl Mul for Fr {
    type Output = Fr;

    fn mul(self, rhs: Fr) -> Fr {
        Fr(self.0.mul_mod(rhs.0, MODULUS))
    }
}

impl fmt::Display for Fr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.to_be_bytes()))
    }
}

impl fmt::Debug for Fr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fr({})", self)
    }
}
