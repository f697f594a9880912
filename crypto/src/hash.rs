//! Blake2b hashing.

use blake2::digest::consts::{U32, U64};
use blake2::{Blake2b, Digest};
use curve25519_dalek_ng::scalar::Scalar;

type Blake2b256 = Blake2b<U32>;
type Blake2b512 = Blake2b<U64>;

/// Compute a 256-bit Blake2b hash of arbitrary data.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    blake2b_256_multi(&[data])
}

/// Hash multiple byte slices in sequence (avoids concatenation allocation).
pub fn blake2b_256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    let mut output = [0u8; 32];
    output.copy_from_slice(&hasher.finalize());
    output
}

/// 512-bit Blake2b over several parts, used for uniform scalar derivation.
pub fn blake2b_512_multi(parts: &[&[u8]]) -> [u8; 64] {
    let mut hasher = Blake2b512::new();
    for part in parts {
        hasher.update(part);
    }
    let mut output = [0u8; 64];
    output.copy_from_slice(&hasher.finalize());
    output
}

/// Map arbitrary bytes to a uniformly distributed scalar.
pub fn hash_to_scalar(parts: &[&[u8]]) -> Scalar {
    Scalar::from_bytes_mod_order_wide(&blake2b_512_multi(parts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blake2b_deterministic() {
        assert_eq!(blake2b_256(b"hello glint"), blake2b_256(b"hello glint"));
        assert_ne!(blake2b_256(b"hello"), blake2b_256(b"world"));
    }

    #[test]
    fn blake2b_empty() {
        assert_ne!(blake2b_256(b""), [0u8; 32]);
    }

    #[test]
    fn blake2b_multi_equivalent() {
        let single = blake2b_256(b"helloworld");
        let multi = blake2b_256_multi(&[b"hello", b"world"]);
        assert_eq!(single, multi);
    }

    #[test]
    fn scalar_derivation() {
        assert_eq!(hash_to_scalar(&[b"x"]), hash_to_scalar(&[b"x"]));
        assert_ne!(hash_to_scalar(&[b"x"]), hash_to_scalar(&[b"y"]));
        assert_ne!(hash_to_scalar(&[b"x"]), Scalar::zero());
    }
}
