//! 32-byte hash type used for header identities, state ids and digests.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// A 32-byte hash.
///
/// Ordering is lexicographic over the bytes, which is the same as comparing
/// the hashes as big-endian 256-bit integers.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Hash256([u8; 32]);

impl Hash256 {
    /// The all-zero hash. Used as the parent of genesis and as the state id
    /// of an empty ledger.
    pub const ZERO: Self = Self([0u8; 32]);

    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, TypesError> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| TypesError::InvalidLength {
            expected: 32,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Number of leading zero bits. This is the PoPoW level of a header hash.
    pub fn leading_zero_bits(&self) -> u32 {
        let mut bits = 0;
        for byte in self.0 {
            if byte == 0 {
                bits += 8;
            } else {
                bits += byte.leading_zeros();
                break;
            }
        }
        bits
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

impl FromStr for Hash256 {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).ok_or_else(|| TypesError::InvalidHex(s.to_string()))?;
        Self::from_slice(&bytes)
    }
}

// Inline hex so that the leaf crate stays dependency-light.
mod hex {
    pub fn encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    pub fn decode(s: &str) -> Option<Vec<u8>> {
        if s.len() % 2 != 0 {
            return None;
        }
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(s.get(i..i + 2)?, 16).ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_zero_bits_counts_across_bytes() {
        let mut bytes = [0xffu8; 32];
        assert_eq!(Hash256::new(bytes).leading_zero_bits(), 0);
        bytes[0] = 0;
        bytes[1] = 0x1f;
        assert_eq!(Hash256::new(bytes).leading_zero_bits(), 11);
        assert_eq!(Hash256::ZERO.leading_zero_bits(), 256);
    }

    #[test]
    fn hex_round_trip() {
        let h = Hash256::new([0xab; 32]);
        let parsed: Hash256 = h.to_string().parse().unwrap();
        assert_eq!(parsed, h);
        assert!("abc".parse::<Hash256>().is_err());
        assert!("zz".repeat(32).parse::<Hash256>().is_err());
    }

    #[test]
    fn ordering_is_big_endian() {
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        a[31] = 0xff;
        b[0] = 0x01;
        assert!(Hash256::new(b) > Hash256::new(a));
    }
}
