//! Proof-of-work validation.

use primitive_types::U256;

use glint_crypto::blake2b_256_multi;

use crate::target::compact_to_target;
use crate::WorkError;

/// The pluggable mining hash.
///
/// `height` lets an implementation switch algorithm or seed at fork heights.
pub trait PowOracle: Send + Sync {
    fn pow_hash(&self, template: &[u8], nonce: u64, height: u64) -> [u8; 32];
}

/// Blake2b-256 over the serialized template followed by the little-endian nonce.
#[derive(Clone, Copy, Debug, Default)]
pub struct Blake2bOracle;

impl PowOracle for Blake2bOracle {
    fn pow_hash(&self, template: &[u8], nonce: u64, _height: u64) -> [u8; 32] {
        blake2b_256_multi(&[template, &nonce.to_le_bytes()])
    }
}

/// Whether `hash`, read as a big-endian integer, is strictly below `target`.
pub fn hash_meets_target(hash: &[u8; 32], target: &U256) -> bool {
    U256::from_big_endian(hash) < *target
}

/// Check the proof of work of a header template and nonce against its compact target.
pub fn validate_pow(
    oracle: &(impl PowOracle + ?Sized),
    template: &[u8],
    nonce: u64,
    height: u64,
    bits: u32,
) -> Result<(), WorkError> {
    let target = compact_to_target(bits)?;
    if hash_meets_target(&oracle.pow_hash(template, nonce, height), &target) {
        Ok(())
    } else {
        Err(WorkError::InsufficientWork)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparison_is_strict() {
        let target = U256::from(5u64);
        let mut hash = [0u8; 32];
        hash[31] = 5;
        assert!(!hash_meets_target(&hash, &target));
        hash[31] = 4;
        assert!(hash_meets_target(&hash, &target));
    }

    #[test]
    fn oracle_depends_on_nonce() {
        let oracle = Blake2bOracle;
        assert_ne!(oracle.pow_hash(b"t", 0, 0), oracle.pow_hash(b"t", 1, 0));
        assert_eq!(oracle.pow_hash(b"t", 7, 0), oracle.pow_hash(b"t", 7, 99));
    }

    #[test]
    fn invalid_bits_is_an_error() {
        assert_eq!(
            validate_pow(&Blake2bOracle, b"t", 0, 0, 0),
            Err(WorkError::InvalidCompactTarget(0))
        );
    }
}
