//! Block headers, their proof-of-proof-of-work interlink and chain metadata.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use glint_crypto::{blake2b_256_multi, decompress, value_point};
use glint_types::Hash256;
use glint_work::{PowOracle, Work};

use crate::codec;
use crate::LedgerError;

/// The three accumulator roots a header commits to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MerkleRoots {
    /// Sum of unspent APCs.
    pub commitment: [u8; 32],
    /// Hash root over every output index ever confirmed.
    pub output: [u8; 32],
    /// Point half of the excess root: sum of every excess key.
    pub excess_point: [u8; 32],
    /// Hash half of the excess root.
    pub excess_digest: [u8; 32],
}

impl MerkleRoots {
    pub fn excess_bytes(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&self.excess_point);
        out[32..].copy_from_slice(&self.excess_digest);
        out
    }

    /// Build from raw accumulator roots of 32, 32 and 64 bytes.
    pub fn from_roots(
        commitment: &[u8],
        output: &[u8],
        excess: &[u8],
    ) -> Result<Self, LedgerError> {
        let fixed = |bytes: &[u8], what: &str| -> Result<[u8; 32], LedgerError> {
            bytes.try_into().map_err(|_| {
                LedgerError::Malformed(format!("{what} root has {} bytes", bytes.len()))
            })
        };
        if excess.len() != 64 {
            return Err(LedgerError::Malformed(format!(
                "excess root has {} bytes",
                excess.len()
            )));
        }
        Ok(Self {
            commitment: fixed(commitment, "commitment")?,
            output: fixed(output, "output")?,
            excess_point: fixed(&excess[..32], "excess")?,
            excess_digest: fixed(&excess[32..], "excess")?,
        })
    }

    /// Whether `commitment == excess_point + supply*H`.
    ///
    /// Holds for every honestly built chain: each transaction's outputs
    /// minus its inputs equal its excess keys plus minted coins minus fees.
    pub fn balances_with(&self, supply: u64) -> bool {
        let (Ok(commitment), Ok(excess)) = (
            decompress(&self.commitment),
            decompress(&self.excess_point),
        ) else {
            return false;
        };
        commitment == excess + value_point(supply)
    }
}

/// Everything hashed into a header except the nonce.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderTemplate {
    pub version: u32,
    pub height: u64,
    pub supply: u64,
    pub roots: MerkleRoots,
    /// Interlink: slot `i` is the nearest ancestor whose hash level is at least `i`.
    pub popow: Vec<Hash256>,
    pub votedata: [u8; 8],
    pub timestamp: u64,
    pub bits: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub template: HeaderTemplate,
    pub nonce: u64,
}

/// Leading zero bits of a hash.
pub fn hash_level(hash: &Hash256) -> usize {
    hash.leading_zero_bits() as usize
}

/// Interlink of a child whose parent has `parent_popow` and hash `parent_hash`.
pub fn next_popow(parent_popow: &[Hash256], parent_hash: &Hash256) -> Vec<Hash256> {
    let level = hash_level(parent_hash);
    let mut popow = parent_popow.to_vec();
    if popow.len() < level + 1 {
        popow.resize(level + 1, *parent_hash);
    }
    for slot in popow.iter_mut().take(level + 1) {
        *slot = *parent_hash;
    }
    popow
}

impl HeaderTemplate {
    pub fn to_bytes(&self) -> Vec<u8> {
        codec::encode(self)
    }

    pub fn prev(&self) -> Hash256 {
        self.popow.first().copied().unwrap_or(Hash256::ZERO)
    }
}

impl Header {
    pub fn new(template: HeaderTemplate, nonce: u64) -> Self {
        Self { template, nonce }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        codec::encode(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LedgerError> {
        codec::decode(bytes)
    }

    /// Identity: Blake2b over the serialized template and the little-endian nonce.
    pub fn hash(&self) -> Hash256 {
        Hash256::new(blake2b_256_multi(&[
            &self.template.to_bytes(),
            &self.nonce.to_le_bytes(),
        ]))
    }

    pub fn pow_hash(&self, oracle: &(impl PowOracle + ?Sized)) -> [u8; 32] {
        oracle.pow_hash(&self.template.to_bytes(), self.nonce, self.template.height)
    }

    pub fn height(&self) -> u64 {
        self.template.height
    }

    pub fn prev(&self) -> Hash256 {
        self.template.prev()
    }

    pub fn is_genesis(&self) -> bool {
        self.template.height == 0
    }

    pub fn work(&self) -> Result<Work, LedgerError> {
        Ok(Work::from_compact(self.template.bits)?)
    }

    /// Checks that need no other header: the interlink is non-empty exactly
    /// when the header has a parent, and slot `i` names a hash of level `i`
    /// or more.
    pub fn is_self_consistent(&self) -> bool {
        let popow = &self.template.popow;
        if popow.is_empty() != self.is_genesis() {
            return false;
        }
        popow
            .iter()
            .enumerate()
            .all(|(slot, hash)| !hash.is_zero() && hash_level(hash) >= slot)
    }
}

/// A header with the metadata the chain manager tracks for it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextHeader {
    pub header: Header,
    pub hash: Hash256,
    pub descendants: BTreeSet<Hash256>,
    pub connected_to_genesis: bool,
    pub invalid: bool,
    pub reason: Option<String>,
    /// Upper bound on supply at this header: subsidies summed from genesis.
    pub coins_to_be_mint: u64,
    pub total_difficulty: Work,
}

impl ContextHeader {
    pub fn new(header: Header) -> Self {
        let hash = header.hash();
        Self {
            header,
            hash,
            descendants: BTreeSet::new(),
            connected_to_genesis: false,
            invalid: false,
            reason: None,
            coins_to_be_mint: 0,
            total_difficulty: Work::ZERO,
        }
    }

    pub fn height(&self) -> u64 {
        self.header.height()
    }

    pub fn prev(&self) -> Hash256 {
        self.header.prev()
    }

    /// Connected to genesis and not marked invalid.
    pub fn is_valid_connected(&self) -> bool {
        self.connected_to_genesis && !self.invalid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash_with_level(level: usize) -> Hash256 {
        let mut bytes = [0xffu8; 32];
        for bit in 0..level {
            bytes[bit / 8] &= !(0x80 >> (bit % 8));
        }
        Hash256::new(bytes)
    }

    fn template(height: u64, popow: Vec<Hash256>) -> HeaderTemplate {
        HeaderTemplate {
            version: 1,
            height,
            supply: 0,
            roots: MerkleRoots::default(),
            popow,
            votedata: [0; 8],
            timestamp: 0,
            bits: 0x207f_ffff,
        }
    }

    #[test]
    fn next_popow_overwrites_low_slots() {
        let grand = hash_with_level(3);
        let parent = hash_with_level(1);
        let popow = next_popow(&[], &grand);
        assert_eq!(popow, vec![grand; 4]);
        let child = next_popow(&popow, &parent);
        assert_eq!(child, vec![parent, parent, grand, grand]);
    }

    #[test]
    fn next_popow_extends_for_deep_parent() {
        let low = hash_with_level(0);
        let deep = hash_with_level(2);
        let child = next_popow(&next_popow(&[], &low), &deep);
        assert_eq!(child, vec![deep; 3]);
    }

    #[test]
    fn self_consistency_checks_levels() {
        let parent = hash_with_level(1);
        let good = Header::new(template(5, next_popow(&[], &parent)), 0);
        assert!(good.is_self_consistent());

        let bad = Header::new(template(5, vec![parent, parent, parent]), 0);
        assert!(!bad.is_self_consistent());

        let orphan_genesis = Header::new(template(0, vec![parent]), 0);
        assert!(!orphan_genesis.is_self_consistent());

        let parentless = Header::new(template(3, Vec::new()), 0);
        assert!(!parentless.is_self_consistent());
    }

    #[test]
    fn nonce_changes_hash_not_template() {
        let a = Header::new(template(1, vec![hash_with_level(0)]), 1);
        let b = Header::new(a.template.clone(), 2);
        assert_ne!(a.hash(), b.hash());
        assert_eq!(a.prev(), b.prev());
    }

    #[test]
    fn empty_roots_balance_zero_supply() {
        assert!(MerkleRoots::default().balances_with(0));
        assert!(!MerkleRoots::default().balances_with(1));
    }

    #[test]
    fn header_decodes_what_it_encodes() {
        let header = Header::new(template(2, vec![hash_with_level(0)]), 9);
        assert_eq!(Header::from_bytes(&header.to_bytes()).unwrap(), header);
        assert!(Header::from_bytes(&[0xff; 3]).is_err());
    }
}
