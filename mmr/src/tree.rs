//! The accumulator itself.
//!
//! Storage layout, every key prefixed with the tree id byte:
//!
//! | table        | key                    | value                 |
//! |--------------|------------------------|-----------------------|
//! | `MmrMeta`    | `b'c'`                 | leaf count (u64 BE)   |
//! | `MmrMeta`    | `b's'`                 | state id (32 bytes)   |
//! | `MmrLeaves`  | sequence (u64 BE)      | object                |
//! | `MmrIndexes` | index                  | sequence (u64 BE)     |
//! | `MmrOrders`  | sequence (u64 BE)      | index                 |
//! | `MmrNodes`   | level (u8), position   | node value            |
//! | `MmrArchive` | index                  | pruned object         |
//!
//! Node `(L, P)` is `sum(node(L-1, 2P), node(L-1, 2P+1))` when both children
//! exist and a copy of `node(L-1, 2P)` otherwise. The root is the single node
//! on level `ceil(log2(count))`.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use glint_store::{ReadTxn, Table, WriteTxn};

use crate::{MmrError, Summator};

const COUNT_KEY: u8 = b'c';
const STATE_KEY: u8 = b's';

/// Which in-place pruning a tree supports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PruneMode {
    /// Spent leaves become neutral holes.
    ClearOnly,
    /// Spent leaves keep their slot value; only the object is dropped.
    DiscardOnly,
    /// No pruning at all.
    Neither,
}

/// What `clear` or `discard` removed, enough to put it back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrunedRecord {
    pub seq: u64,
    pub index: Vec<u8>,
    pub object: Vec<u8>,
}

/// A prefix-search hit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FuzzyMatch {
    pub index: Vec<u8>,
    pub object: Vec<u8>,
    /// Whether the object came from the pruned archive.
    pub pruned: bool,
}

pub struct Mmr<S> {
    tree: u8,
    name: &'static str,
    mode: PruneMode,
    summator: S,
}

fn key(tree: u8, rest: &[u8]) -> Vec<u8> {
    let mut k = Vec::with_capacity(1 + rest.len());
    k.push(tree);
    k.extend_from_slice(rest);
    k
}

fn node_key(tree: u8, level: u8, pos: u64) -> Vec<u8> {
    let mut k = Vec::with_capacity(10);
    k.push(tree);
    k.push(level);
    k.extend_from_slice(&pos.to_be_bytes());
    k
}

fn read_u64(bytes: &[u8]) -> Result<u64, MmrError> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| MmrError::Corrupted(format!("expected 8 bytes, got {}", bytes.len())))?;
    Ok(u64::from_be_bytes(arr))
}

/// Number of nodes on `level` for `count` leaves.
fn width(count: u64, level: u32) -> u64 {
    if level >= 64 {
        return u64::from(count > 0);
    }
    let span = 1u64 << level;
    count / span + u64::from(count % span != 0)
}

/// Level of the root: `ceil(log2(count))`, zero for zero or one leaf.
fn top_level(count: u64) -> u32 {
    if count <= 1 {
        0
    } else {
        64 - (count - 1).leading_zeros()
    }
}

impl<S: Summator> Mmr<S> {
    pub fn new(tree: u8, name: &'static str, mode: PruneMode, summator: S) -> Self {
        Self {
            tree,
            name,
            mode,
            summator,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn mode(&self) -> PruneMode {
        self.mode
    }

    pub fn summator(&self) -> &S {
        &self.summator
    }

    // ── Queries ──────────────────────────────────────────────────────────

    pub fn count(&self, txn: &(impl ReadTxn + ?Sized)) -> Result<u64, MmrError> {
        match txn.get(Table::MmrMeta, &key(self.tree, &[COUNT_KEY]))? {
            Some(bytes) => read_u64(&bytes),
            None => Ok(0),
        }
    }

    pub fn get_root(&self, txn: &(impl ReadTxn + ?Sized)) -> Result<Vec<u8>, MmrError> {
        let count = self.count(txn)?;
        if count == 0 {
            return Ok(self.summator.empty_root());
        }
        self.node(txn, top_level(count), 0)
    }

    /// State marker stored alongside the tree; all zero when never set.
    pub fn get_state(&self, txn: &(impl ReadTxn + ?Sized)) -> Result<[u8; 32], MmrError> {
        match txn.get(Table::MmrMeta, &key(self.tree, &[STATE_KEY]))? {
            Some(bytes) => bytes
                .as_slice()
                .try_into()
                .map_err(|_| MmrError::Corrupted("state id is not 32 bytes".to_string())),
            None => Ok([0u8; 32]),
        }
    }

    pub fn set_state(
        &self,
        txn: &mut (impl WriteTxn + ?Sized),
        state: &[u8; 32],
    ) -> Result<(), MmrError> {
        txn.put(Table::MmrMeta, &key(self.tree, &[STATE_KEY]), state)?;
        Ok(())
    }

    /// Sequence number of `index`, if the index still occupies a slot.
    pub fn find_by_hash(
        &self,
        txn: &(impl ReadTxn + ?Sized),
        index: &[u8],
    ) -> Result<Option<u64>, MmrError> {
        txn.get(Table::MmrIndexes, &key(self.tree, index))?
            .map(|bytes| read_u64(&bytes))
            .transpose()
    }

    /// Live object stored under `index`.
    pub fn get_by_hash(
        &self,
        txn: &(impl ReadTxn + ?Sized),
        index: &[u8],
    ) -> Result<Option<Vec<u8>>, MmrError> {
        let Some(seq) = self.find_by_hash(txn, index)? else {
            return Ok(None);
        };
        Ok(txn.get(Table::MmrLeaves, &key(self.tree, &seq.to_be_bytes()))?)
    }

    /// Object pruned from the tree but kept for sync requests.
    pub fn get_pruned(
        &self,
        txn: &(impl ReadTxn + ?Sized),
        index: &[u8],
    ) -> Result<Option<Vec<u8>>, MmrError> {
        Ok(txn.get(Table::MmrArchive, &key(self.tree, index))?)
    }

    /// Every index starting with `prefix`, live or pruned, in index order.
    pub fn fuzzy_search(
        &self,
        txn: &(impl ReadTxn + ?Sized),
        prefix: &[u8],
    ) -> Result<Vec<FuzzyMatch>, MmrError> {
        let scan_prefix = key(self.tree, prefix);
        let mut found: BTreeMap<Vec<u8>, FuzzyMatch> = BTreeMap::new();

        for (k, seq) in txn.prefix_scan(Table::MmrIndexes, &scan_prefix)? {
            let index = k[1..].to_vec();
            let seq = read_u64(&seq)?;
            if let Some(object) = txn.get(Table::MmrLeaves, &key(self.tree, &seq.to_be_bytes()))? {
                found.insert(
                    index.clone(),
                    FuzzyMatch {
                        index,
                        object,
                        pruned: false,
                    },
                );
            }
        }
        for (k, object) in txn.prefix_scan(Table::MmrArchive, &scan_prefix)? {
            let index = k[1..].to_vec();
            found.entry(index.clone()).or_insert(FuzzyMatch {
                index,
                object,
                pruned: true,
            });
        }
        Ok(found.into_values().collect())
    }

    /// Index at sequence `seq`, unless the slot was cleared.
    pub fn index_at(
        &self,
        txn: &(impl ReadTxn + ?Sized),
        seq: u64,
    ) -> Result<Option<Vec<u8>>, MmrError> {
        Ok(txn.get(Table::MmrOrders, &key(self.tree, &seq.to_be_bytes()))?)
    }

    // ── Mutations ────────────────────────────────────────────────────────

    /// Append a leaf and return its sequence number.
    pub fn append(
        &self,
        txn: &mut (impl WriteTxn + ?Sized),
        index: &[u8],
        object: &[u8],
    ) -> Result<u64, MmrError> {
        let seq = self.count(txn)?;
        let seq_key = key(self.tree, &seq.to_be_bytes());
        txn.put(Table::MmrLeaves, &seq_key, object)?;
        txn.put(Table::MmrIndexes, &key(self.tree, index), &seq.to_be_bytes())?;
        txn.put(Table::MmrOrders, &seq_key, index)?;
        let leaf = self.summator.leaf(index)?;
        txn.put(Table::MmrNodes, &node_key(self.tree, 0, seq), &leaf)?;
        self.set_count(txn, seq + 1)?;
        self.update_path(txn, seq, seq + 1)?;
        Ok(seq)
    }

    /// Append, failing with [`MmrError::DuplicateIndex`] if `index` is present.
    pub fn append_unique(
        &self,
        txn: &mut (impl WriteTxn + ?Sized),
        index: &[u8],
        object: &[u8],
    ) -> Result<u64, MmrError> {
        if self.find_by_hash(txn, index)?.is_some() {
            return Err(MmrError::DuplicateIndex(hex::encode(index)));
        }
        self.append(txn, index, object)
    }

    /// Truncate the last `n` leaves and return what they held, oldest first.
    ///
    /// With `expected`, every removed index must be in the set. A cleared
    /// slot has lost its index, so its archive entry could not be dropped
    /// with it: truncating one fails before anything is deleted. Discarded
    /// slots take their archive entry with them.
    pub fn remove(
        &self,
        txn: &mut (impl WriteTxn + ?Sized),
        n: u64,
        expected: Option<&HashSet<Vec<u8>>>,
    ) -> Result<Vec<(Vec<u8>, Option<Vec<u8>>)>, MmrError> {
        let count = self.count(txn)?;
        if n > count {
            return Err(MmrError::RemoveTooMany {
                requested: n,
                count,
            });
        }
        if n == 0 {
            return Ok(Vec::new());
        }
        let new_count = count - n;

        let mut removed = Vec::with_capacity(n as usize);
        for seq in new_count..count {
            let seq_key = key(self.tree, &seq.to_be_bytes());
            let Some(index) = txn.get(Table::MmrOrders, &seq_key)? else {
                return Err(MmrError::TruncatesCleared(seq));
            };
            if let Some(expected) = expected {
                if !expected.contains(&index) {
                    return Err(MmrError::UnexpectedRemoval(hex::encode(&index)));
                }
            }
            removed.push((index, txn.get(Table::MmrLeaves, &seq_key)?));
        }
        for (offset, (index, _)) in removed.iter().enumerate() {
            let seq_key = key(self.tree, &(new_count + offset as u64).to_be_bytes());
            txn.delete(Table::MmrIndexes, &key(self.tree, index))?;
            txn.delete(Table::MmrArchive, &key(self.tree, index))?;
            txn.delete(Table::MmrLeaves, &seq_key)?;
            txn.delete(Table::MmrOrders, &seq_key)?;
        }

        let old_top = top_level(count);
        let new_top = top_level(new_count);
        for level in 0..=old_top {
            let keep = if new_count == 0 || level > new_top {
                0
            } else {
                width(new_count, level)
            };
            for pos in keep..width(count, level) {
                txn.delete(Table::MmrNodes, &node_key(self.tree, level as u8, pos))?;
            }
        }

        self.set_count(txn, new_count)?;
        if new_count > 0 {
            self.update_path(txn, new_count - 1, new_count)?;
        }
        tracing::trace!(tree = self.name, n, new_count, "truncated accumulator");
        Ok(removed)
    }

    /// Replace a leaf with the neutral element and drop its object and index.
    pub fn clear(
        &self,
        txn: &mut (impl WriteTxn + ?Sized),
        index: &[u8],
    ) -> Result<PrunedRecord, MmrError> {
        self.require_mode(PruneMode::ClearOnly, "clear")?;
        let (seq, object) = self.live_leaf(txn, index)?;
        let seq_key = key(self.tree, &seq.to_be_bytes());

        txn.delete(Table::MmrLeaves, &seq_key)?;
        txn.delete(Table::MmrIndexes, &key(self.tree, index))?;
        txn.delete(Table::MmrOrders, &seq_key)?;
        txn.put(Table::MmrArchive, &key(self.tree, index), &object)?;
        txn.put(
            Table::MmrNodes,
            &node_key(self.tree, 0, seq),
            &self.summator.neutral(),
        )?;
        let count = self.count(txn)?;
        self.update_path(txn, seq, count)?;

        Ok(PrunedRecord {
            seq,
            index: index.to_vec(),
            object,
        })
    }

    /// Drop a leaf's object but keep its index and slot value.
    pub fn discard(
        &self,
        txn: &mut (impl WriteTxn + ?Sized),
        index: &[u8],
    ) -> Result<PrunedRecord, MmrError> {
        self.require_mode(PruneMode::DiscardOnly, "discard")?;
        let (seq, object) = self.live_leaf(txn, index)?;

        txn.delete(Table::MmrLeaves, &key(self.tree, &seq.to_be_bytes()))?;
        txn.put(Table::MmrArchive, &key(self.tree, index), &object)?;

        Ok(PrunedRecord {
            seq,
            index: index.to_vec(),
            object,
        })
    }

    /// Exact inverse of [`Mmr::clear`]. Callers revert in LIFO order.
    pub fn revert_clearing(
        &self,
        txn: &mut (impl WriteTxn + ?Sized),
        record: &PrunedRecord,
    ) -> Result<(), MmrError> {
        self.require_mode(PruneMode::ClearOnly, "revert_clearing")?;
        let seq_key = key(self.tree, &record.seq.to_be_bytes());

        txn.put(Table::MmrLeaves, &seq_key, &record.object)?;
        txn.put(
            Table::MmrIndexes,
            &key(self.tree, &record.index),
            &record.seq.to_be_bytes(),
        )?;
        txn.put(Table::MmrOrders, &seq_key, &record.index)?;
        txn.delete(Table::MmrArchive, &key(self.tree, &record.index))?;
        let leaf = self.summator.leaf(&record.index)?;
        txn.put(Table::MmrNodes, &node_key(self.tree, 0, record.seq), &leaf)?;
        let count = self.count(txn)?;
        self.update_path(txn, record.seq, count)
    }

    /// Exact inverse of [`Mmr::discard`]. Callers revert in LIFO order.
    pub fn revert_discarding(
        &self,
        txn: &mut (impl WriteTxn + ?Sized),
        record: &PrunedRecord,
    ) -> Result<(), MmrError> {
        self.require_mode(PruneMode::DiscardOnly, "revert_discarding")?;
        txn.put(
            Table::MmrLeaves,
            &key(self.tree, &record.seq.to_be_bytes()),
            &record.object,
        )?;
        txn.delete(Table::MmrArchive, &key(self.tree, &record.index))?;
        Ok(())
    }

    // ── Internals ────────────────────────────────────────────────────────

    fn require_mode(&self, mode: PruneMode, operation: &'static str) -> Result<(), MmrError> {
        if self.mode == mode {
            Ok(())
        } else {
            Err(MmrError::WrongPruneMode {
                operation,
                tree: self.name,
            })
        }
    }

    fn live_leaf(
        &self,
        txn: &(impl ReadTxn + ?Sized),
        index: &[u8],
    ) -> Result<(u64, Vec<u8>), MmrError> {
        let seq = self
            .find_by_hash(txn, index)?
            .ok_or_else(|| MmrError::NotFound(hex::encode(index)))?;
        let object = txn
            .get(Table::MmrLeaves, &key(self.tree, &seq.to_be_bytes()))?
            .ok_or_else(|| MmrError::NotFound(hex::encode(index)))?;
        Ok((seq, object))
    }

    fn set_count(&self, txn: &mut (impl WriteTxn + ?Sized), count: u64) -> Result<(), MmrError> {
        txn.put(
            Table::MmrMeta,
            &key(self.tree, &[COUNT_KEY]),
            &count.to_be_bytes(),
        )?;
        Ok(())
    }

    fn node(&self, txn: &(impl ReadTxn + ?Sized), level: u32, pos: u64) -> Result<Vec<u8>, MmrError> {
        txn.get(Table::MmrNodes, &node_key(self.tree, level as u8, pos))?
            .ok_or_else(|| {
                MmrError::Corrupted(format!(
                    "tree {} missing node ({}, {})",
                    self.name, level, pos
                ))
            })
    }

    /// Recompute every ancestor of leaf `seq`, bottom-up.
    fn update_path(
        &self,
        txn: &mut (impl WriteTxn + ?Sized),
        seq: u64,
        count: u64,
    ) -> Result<(), MmrError> {
        for level in 1..=top_level(count) {
            let pos = seq >> level;
            let left = self.node(txn, level - 1, 2 * pos)?;
            let value = if 2 * pos + 1 < width(count, level - 1) {
                let right = self.node(txn, level - 1, 2 * pos + 1)?;
                self.summator.sum(&left, &right)?
            } else {
                left
            };
            txn.put(Table::MmrNodes, &node_key(self.tree, level as u8, pos), &value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HashSum, PointSum};
    use glint_crypto::{commit, Commitment, Scalar};
    use glint_nullables::NullEnvironment;
    use glint_store::Environment;

    fn hash_tree() -> Mmr<HashSum> {
        Mmr::new(1, "hashes", PruneMode::DiscardOnly, HashSum)
    }

    fn point_tree() -> Mmr<PointSum> {
        Mmr::new(2, "points", PruneMode::ClearOnly, PointSum)
    }

    fn point_index(v: u64) -> Vec<u8> {
        let mut index = Commitment::from_point(&commit(v, &Scalar::from(v * 3 + 1)))
            .as_bytes()
            .to_vec();
        index.extend_from_slice(&v.to_be_bytes());
        index
    }

    #[test]
    fn widths_and_levels() {
        assert_eq!(top_level(0), 0);
        assert_eq!(top_level(1), 0);
        assert_eq!(top_level(2), 1);
        assert_eq!(top_level(3), 2);
        assert_eq!(top_level(4), 2);
        assert_eq!(top_level(5), 3);
        assert_eq!(width(5, 0), 5);
        assert_eq!(width(5, 1), 3);
        assert_eq!(width(5, 2), 2);
        assert_eq!(width(5, 3), 1);
    }

    #[test]
    fn empty_root_is_zero() {
        let env = NullEnvironment::new();
        let txn = env.read_txn().unwrap();
        assert_eq!(hash_tree().get_root(&txn).unwrap(), vec![0u8; 32]);
    }

    #[test]
    fn three_leaf_root_copies_odd_child() {
        let env = NullEnvironment::new();
        let tree = hash_tree();
        let mut txn = env.write_txn().unwrap();
        for i in 0u8..3 {
            tree.append(&mut txn, &[i], &[i]).unwrap();
        }
        let s = HashSum;
        let l = |i: u8| s.leaf(&[i]).unwrap();
        let expected = s.sum(&s.sum(&l(0), &l(1)).unwrap(), &l(2)).unwrap();
        assert_eq!(tree.get_root(&txn).unwrap(), expected);
    }

    #[test]
    fn append_unique_rejects_duplicates() {
        let env = NullEnvironment::new();
        let tree = hash_tree();
        let mut txn = env.write_txn().unwrap();
        tree.append_unique(&mut txn, b"a", b"1").unwrap();
        assert!(matches!(
            tree.append_unique(&mut txn, b"a", b"2"),
            Err(MmrError::DuplicateIndex(_))
        ));
    }

    #[test]
    fn wrong_prune_mode_fails() {
        let env = NullEnvironment::new();
        let tree = hash_tree();
        let mut txn = env.write_txn().unwrap();
        tree.append(&mut txn, b"a", b"1").unwrap();
        assert!(matches!(
            tree.clear(&mut txn, b"a"),
            Err(MmrError::WrongPruneMode { .. })
        ));
        let neither = Mmr::new(3, "plain", PruneMode::Neither, HashSum);
        neither.append(&mut txn, b"a", b"1").unwrap();
        assert!(neither.discard(&mut txn, b"a").is_err());
    }

    #[test]
    fn cleared_leaf_drops_out_of_point_sum() {
        let env = NullEnvironment::new();
        let tree = point_tree();
        let mut txn = env.write_txn().unwrap();
        tree.append(&mut txn, &point_index(1), b"one").unwrap();
        tree.append(&mut txn, &point_index(2), b"two").unwrap();
        tree.clear(&mut txn, &point_index(1)).unwrap();

        let other = Mmr::new(9, "other", PruneMode::ClearOnly, PointSum);
        other.append(&mut txn, &point_index(2), b"two").unwrap();
        assert_eq!(tree.get_root(&txn).unwrap(), other.get_root(&txn).unwrap());
        assert_eq!(tree.get_by_hash(&txn, &point_index(1)).unwrap(), None);
        assert_eq!(
            tree.get_pruned(&txn, &point_index(1)).unwrap(),
            Some(b"one".to_vec())
        );
    }

    #[test]
    fn discard_keeps_root_and_index() {
        let env = NullEnvironment::new();
        let tree = hash_tree();
        let mut txn = env.write_txn().unwrap();
        tree.append(&mut txn, b"a", b"1").unwrap();
        tree.append(&mut txn, b"b", b"2").unwrap();
        let root = tree.get_root(&txn).unwrap();
        let record = tree.discard(&mut txn, b"a").unwrap();
        assert_eq!(tree.get_root(&txn).unwrap(), root);
        assert_eq!(tree.find_by_hash(&txn, b"a").unwrap(), Some(0));
        assert_eq!(tree.get_by_hash(&txn, b"a").unwrap(), None);
        assert!(tree.discard(&mut txn, b"a").is_err());
        tree.revert_discarding(&mut txn, &record).unwrap();
        assert_eq!(tree.get_by_hash(&txn, b"a").unwrap(), Some(b"1".to_vec()));
    }

    #[test]
    fn remove_guard_rejects_unexpected_leaves() {
        let env = NullEnvironment::new();
        let tree = hash_tree();
        let mut txn = env.write_txn().unwrap();
        tree.append(&mut txn, b"a", b"1").unwrap();
        tree.append(&mut txn, b"b", b"2").unwrap();
        let expected: HashSet<Vec<u8>> = [b"a".to_vec()].into_iter().collect();
        assert!(matches!(
            tree.remove(&mut txn, 1, Some(&expected)),
            Err(MmrError::UnexpectedRemoval(_))
        ));
        assert!(matches!(
            tree.remove(&mut txn, 3, None),
            Err(MmrError::RemoveTooMany { .. })
        ));
    }

    #[test]
    fn truncation_leaves_no_archive_behind() {
        let env = NullEnvironment::new();
        let hashes = hash_tree();
        let points = point_tree();
        let mut txn = env.write_txn().unwrap();

        hashes.append(&mut txn, b"a", b"1").unwrap();
        hashes.append(&mut txn, b"b", b"2").unwrap();
        hashes.discard(&mut txn, b"b").unwrap();
        let removed = hashes.remove(&mut txn, 1, None).unwrap();
        assert_eq!(removed, vec![(b"b".to_vec(), None)]);
        assert_eq!(hashes.get_pruned(&txn, b"b").unwrap(), None);

        let spent = point_index(8);
        points.append(&mut txn, &point_index(7), b"kept").unwrap();
        points.append(&mut txn, &spent, b"spent").unwrap();
        let record = points.clear(&mut txn, &spent).unwrap();
        assert!(matches!(
            points.remove(&mut txn, 1, None),
            Err(MmrError::TruncatesCleared(1))
        ));
        assert_eq!(points.count(&txn).unwrap(), 2);
        assert!(points.get_pruned(&txn, &spent).unwrap().is_some());

        points.revert_clearing(&mut txn, &record).unwrap();
        points.remove(&mut txn, 1, None).unwrap();
        assert_eq!(points.get_pruned(&txn, &spent).unwrap(), None);
        assert_eq!(points.find_by_hash(&txn, &spent).unwrap(), None);
        assert_eq!(txn.prefix_scan(Table::MmrArchive, &[2]).unwrap().len(), 0);
    }

    #[test]
    fn remove_everything_resets_to_empty() {
        let env = NullEnvironment::new();
        let tree = hash_tree();
        let mut txn = env.write_txn().unwrap();
        for i in 0u8..5 {
            tree.append(&mut txn, &[i], &[i]).unwrap();
        }
        let removed = tree.remove(&mut txn, 5, None).unwrap();
        assert_eq!(removed.len(), 5);
        assert_eq!(removed[0], (vec![0u8], Some(vec![0u8])));
        assert_eq!(tree.count(&txn).unwrap(), 0);
        assert_eq!(tree.get_root(&txn).unwrap(), vec![0u8; 32]);
        assert_eq!(txn.prefix_scan(Table::MmrNodes, &[1]).unwrap().len(), 0);
    }

    #[test]
    fn fuzzy_search_covers_archive() {
        let env = NullEnvironment::new();
        let tree = point_tree();
        let mut txn = env.write_txn().unwrap();
        let a = point_index(5);
        tree.append(&mut txn, &a, b"live").unwrap();
        let b = point_index(6);
        tree.append(&mut txn, &b, b"spent").unwrap();
        tree.clear(&mut txn, &b).unwrap();

        let hits = tree.fuzzy_search(&txn, &b[..4]).unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].pruned);
        assert_eq!(hits[0].object, b"spent".to_vec());

        let all = tree.fuzzy_search(&txn, &[]).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn state_round_trips() {
        let env = NullEnvironment::new();
        let tree = hash_tree();
        let mut txn = env.write_txn().unwrap();
        assert_eq!(tree.get_state(&txn).unwrap(), [0u8; 32]);
        tree.set_state(&mut txn, &[7u8; 32]).unwrap();
        assert_eq!(tree.get_state(&txn).unwrap(), [7u8; 32]);
    }

    #[test]
    fn trees_are_isolated_by_id() {
        let env = NullEnvironment::new();
        let a = Mmr::new(1, "a", PruneMode::Neither, HashSum);
        let b = Mmr::new(2, "b", PruneMode::Neither, HashSum);
        let mut txn = env.write_txn().unwrap();
        a.append(&mut txn, b"x", b"1").unwrap();
        assert_eq!(b.count(&txn).unwrap(), 0);
        assert_eq!(b.find_by_hash(&txn, b"x").unwrap(), None);
    }
}
