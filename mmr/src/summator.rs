//! Node summation rules.
//!
//! Leaf values are derived from the leaf index only, so a leaf can be
//! recomputed after its object has been discarded.

use glint_crypto::{blake2b_256, blake2b_256_multi, decompress, Commitment, CryptoError};

use crate::MmrError;

pub trait Summator: Send + Sync {
    /// Width in bytes of every node value and of the root.
    fn value_size(&self) -> usize;

    /// Value of a live leaf with the given index.
    fn leaf(&self, index: &[u8]) -> Result<Vec<u8>, MmrError>;

    fn sum(&self, left: &[u8], right: &[u8]) -> Result<Vec<u8>, MmrError>;

    /// Value of a cleared slot: `sum(neutral, x) == x` and `sum(neutral, neutral) == neutral`.
    fn neutral(&self) -> Vec<u8>;

    /// Root of an empty tree.
    fn empty_root(&self) -> Vec<u8> {
        vec![0u8; self.value_size()]
    }
}

fn point_prefix(index: &[u8]) -> Result<[u8; 32], MmrError> {
    index
        .get(..32)
        .and_then(|p| p.try_into().ok())
        .ok_or_else(|| MmrError::Corrupted(format!("index of {} bytes has no point", index.len())))
}

fn add_points(left: &[u8], right: &[u8]) -> Result<[u8; 32], MmrError> {
    let a = decompress(&point_prefix(left)?)?;
    let b = decompress(&point_prefix(right)?)?;
    Ok(Commitment::from_point(&(a + b)).as_bytes().to_owned())
}

/// Blake2b over the concatenated children; leaves hash their index.
#[derive(Clone, Copy, Debug, Default)]
pub struct HashSum;

impl Summator for HashSum {
    fn value_size(&self) -> usize {
        32
    }

    fn leaf(&self, index: &[u8]) -> Result<Vec<u8>, MmrError> {
        Ok(blake2b_256(index).to_vec())
    }

    fn sum(&self, left: &[u8], right: &[u8]) -> Result<Vec<u8>, MmrError> {
        Ok(blake2b_256_multi(&[left, right]).to_vec())
    }

    fn neutral(&self) -> Vec<u8> {
        vec![0u8; 32]
    }
}

/// Curve-point addition; the leaf is the point the index starts with.
///
/// The identity point is neutral, so cleared leaves drop out of the sum.
#[derive(Clone, Copy, Debug, Default)]
pub struct PointSum;

impl Summator for PointSum {
    fn value_size(&self) -> usize {
        32
    }

    fn leaf(&self, index: &[u8]) -> Result<Vec<u8>, MmrError> {
        let point = point_prefix(index)?;
        decompress(&point)?;
        Ok(point.to_vec())
    }

    fn sum(&self, left: &[u8], right: &[u8]) -> Result<Vec<u8>, MmrError> {
        Ok(add_points(left, right)?.to_vec())
    }

    fn neutral(&self) -> Vec<u8> {
        Commitment::IDENTITY.as_bytes().to_vec()
    }
}

/// A point half summed by addition and a hash half summed by Blake2b.
#[derive(Clone, Copy, Debug, Default)]
pub struct PointHashSum;

impl Summator for PointHashSum {
    fn value_size(&self) -> usize {
        64
    }

    fn leaf(&self, index: &[u8]) -> Result<Vec<u8>, MmrError> {
        let point = point_prefix(index)?;
        decompress(&point)?;
        let mut value = point.to_vec();
        value.extend_from_slice(&blake2b_256(index));
        Ok(value)
    }

    fn sum(&self, left: &[u8], right: &[u8]) -> Result<Vec<u8>, MmrError> {
        if left.len() != 64 || right.len() != 64 {
            return Err(MmrError::Crypto(CryptoError::InvalidPoint));
        }
        let mut value = add_points(left, right)?.to_vec();
        value.extend_from_slice(&blake2b_256_multi(&[&left[32..], &right[32..]]));
        Ok(value)
    }

    fn neutral(&self) -> Vec<u8> {
        vec![0u8; 64]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_crypto::{commit, Scalar};

    fn point(v: u64) -> Vec<u8> {
        Commitment::from_point(&commit(v, &Scalar::from(v + 1)))
            .as_bytes()
            .to_vec()
    }

    #[test]
    fn point_neutral_absorbs() {
        let s = PointSum;
        let x = point(3);
        assert_eq!(s.sum(&s.neutral(), &x).unwrap(), x);
        assert_eq!(s.sum(&x, &s.neutral()).unwrap(), x);
        assert_eq!(s.sum(&s.neutral(), &s.neutral()).unwrap(), s.neutral());
    }

    #[test]
    fn point_sum_is_addition() {
        let s = PointSum;
        let expected = Commitment::from_point(&(commit(3, &Scalar::from(4u64)) + commit(5, &Scalar::from(6u64))));
        assert_eq!(s.sum(&point(3), &point(5)).unwrap(), expected.as_bytes().to_vec());
    }

    #[test]
    fn point_leaf_rejects_invalid_point() {
        assert!(PointSum.leaf(&[0xff; 64]).is_err());
        assert!(PointSum.leaf(&[0u8; 10]).is_err());
    }

    #[test]
    fn hash_sum_is_order_sensitive() {
        let a = HashSum.leaf(b"a").unwrap();
        let b = HashSum.leaf(b"b").unwrap();
        assert_ne!(HashSum.sum(&a, &b).unwrap(), HashSum.sum(&b, &a).unwrap());
    }

    #[test]
    fn point_hash_leaf_layout() {
        let mut index = point(1);
        index.extend_from_slice(&[7u8; 32]);
        let leaf = PointHashSum.leaf(&index).unwrap();
        assert_eq!(&leaf[..32], &index[..32]);
        assert_eq!(&leaf[32..], &blake2b_256(&index));
    }
}
