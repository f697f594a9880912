//! Confirmed outputs: two accumulators that move in lockstep.
//!
//! The commitment tree sums APC points and clears spent leaves to the
//! identity, so its root is the sum of unspent commitments. The output tree
//! hashes every index ever confirmed and only discards the payload on spend.

use glint_mmr::{HashSum, Mmr, MmrError, PointSum, PruneMode, PrunedRecord};
use glint_store::{ReadTxn, WriteTxn};
use glint_transactions::{Output, OutputIndex, Transaction};
use glint_types::Hash256;
use serde::{Deserialize, Serialize};

use crate::codec;
use crate::pool::ProvisionalPool;
use crate::LedgerError;

pub const COMMITMENT_TREE: u8 = 1;
pub const OUTPUT_TREE: u8 = 2;

/// What spending one input removed from both trees.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpentOutput {
    pub commitment: PrunedRecord,
    pub output: PrunedRecord,
}

/// A prefix-search hit over live and archived outputs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputMatch {
    pub index: OutputIndex,
    pub output: Output,
    pub pruned: bool,
}

pub(crate) fn root32(root: Vec<u8>) -> Result<[u8; 32], LedgerError> {
    root.as_slice().try_into().map_err(|_| {
        LedgerError::Mmr(MmrError::Corrupted(format!("root of {} bytes", root.len())))
    })
}

fn parse_index(bytes: &[u8]) -> Result<OutputIndex, LedgerError> {
    OutputIndex::from_slice(bytes)
        .ok_or_else(|| LedgerError::Malformed(format!("output index of {} bytes", bytes.len())))
}

pub struct OutputsLedger {
    commitments: Mmr<PointSum>,
    outputs: Mmr<HashSum>,
    pool: ProvisionalPool,
}

impl Default for OutputsLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputsLedger {
    pub fn new() -> Self {
        Self::with_pool(ProvisionalPool::new())
    }

    pub fn with_pool(pool: ProvisionalPool) -> Self {
        Self {
            commitments: Mmr::new(COMMITMENT_TREE, "commitments", PruneMode::ClearOnly, PointSum),
            outputs: Mmr::new(OUTPUT_TREE, "outputs", PruneMode::DiscardOnly, HashSum),
            pool,
        }
    }

    pub fn pool(&self) -> &ProvisionalPool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut ProvisionalPool {
        &mut self.pool
    }

    // ── Queries ──────────────────────────────────────────────────────────

    /// A confirmed, unspent output.
    pub fn get(
        &self,
        txn: &(impl ReadTxn + ?Sized),
        index: &OutputIndex,
    ) -> Result<Option<Output>, LedgerError> {
        self.outputs
            .get_by_hash(txn, &index.to_bytes())?
            .map(|bytes| codec::decode(&bytes))
            .transpose()
    }

    /// A confirmed output that has since been spent.
    pub fn get_pruned(
        &self,
        txn: &(impl ReadTxn + ?Sized),
        index: &OutputIndex,
    ) -> Result<Option<Output>, LedgerError> {
        self.outputs
            .get_pruned(txn, &index.to_bytes())?
            .map(|bytes| codec::decode(&bytes))
            .transpose()
    }

    pub fn is_unspent(
        &self,
        txn: &(impl ReadTxn + ?Sized),
        index: &OutputIndex,
    ) -> Result<bool, LedgerError> {
        Ok(self.outputs.get_by_hash(txn, &index.to_bytes())?.is_some())
    }

    /// Whether the index ever occupied a slot of the output tree.
    pub fn was_confirmed(
        &self,
        txn: &(impl ReadTxn + ?Sized),
        index: &OutputIndex,
    ) -> Result<bool, LedgerError> {
        Ok(self.outputs.find_by_hash(txn, &index.to_bytes())?.is_some())
    }

    /// Unspent and confirmed, or waiting in the provisional pool.
    pub fn known(
        &self,
        txn: &(impl ReadTxn + ?Sized),
        index: &OutputIndex,
    ) -> Result<bool, LedgerError> {
        Ok(self.pool.contains(index) || self.is_unspent(txn, index)?)
    }

    /// Find the payload of `index` wherever it is kept: confirmed, pooled or archived.
    pub fn resolve(
        &self,
        txn: &(impl ReadTxn + ?Sized),
        index: &OutputIndex,
    ) -> Result<Option<Output>, LedgerError> {
        if let Some(output) = self.get(txn, index)? {
            return Ok(Some(output));
        }
        if let Some(output) = self.pool.get(index) {
            return Ok(Some(output.clone()));
        }
        self.get_pruned(txn, index)
    }

    pub fn fuzzy_search(
        &self,
        txn: &(impl ReadTxn + ?Sized),
        prefix: &[u8],
    ) -> Result<Vec<OutputMatch>, LedgerError> {
        self.outputs
            .fuzzy_search(txn, prefix)?
            .into_iter()
            .map(|m| {
                Ok(OutputMatch {
                    index: parse_index(&m.index)?,
                    output: codec::decode(&m.object)?,
                    pruned: m.pruned,
                })
            })
            .collect()
    }

    pub fn count(&self, txn: &(impl ReadTxn + ?Sized)) -> Result<u64, LedgerError> {
        Ok(self.outputs.count(txn)?)
    }

    /// Commitment root and output root.
    pub fn roots(
        &self,
        txn: &(impl ReadTxn + ?Sized),
    ) -> Result<([u8; 32], [u8; 32]), LedgerError> {
        Ok((
            root32(self.commitments.get_root(txn)?)?,
            root32(self.outputs.get_root(txn)?)?,
        ))
    }

    /// State id of the output trees; fails if the two trees disagree.
    pub fn state(&self, txn: &(impl ReadTxn + ?Sized)) -> Result<Hash256, LedgerError> {
        let commitments = Hash256::new(self.commitments.get_state(txn)?);
        let outputs = Hash256::new(self.outputs.get_state(txn)?);
        if commitments != outputs {
            return Err(LedgerError::StateMismatch {
                outputs: outputs.to_string(),
                excesses: format!("commitment tree at {commitments}"),
            });
        }
        Ok(outputs)
    }

    // ── Mutations ────────────────────────────────────────────────────────

    /// Spend the inputs and confirm the outputs of `tx`.
    ///
    /// The provisional pool is left alone: it lives outside `txn`, so the
    /// caller prunes it only after the commit succeeds.
    pub fn apply_tx(
        &self,
        txn: &mut (impl WriteTxn + ?Sized),
        tx: &Transaction,
        state: &Hash256,
    ) -> Result<Vec<SpentOutput>, LedgerError> {
        let spent = self.apply_to_trees(txn, tx)?;
        self.set_state(txn, state)?;
        Ok(spent)
    }

    /// Undo an [`OutputsLedger::apply_tx`] and return the outputs it had
    /// confirmed, for the caller to pool once `txn` commits.
    pub fn rollback(
        &self,
        txn: &mut (impl WriteTxn + ?Sized),
        spent: &[SpentOutput],
        added: u64,
        prev_state: &Hash256,
    ) -> Result<Vec<Output>, LedgerError> {
        let restored = self.undo_trees(txn, spent, added)?;
        self.set_state(txn, prev_state)?;
        Ok(restored)
    }

    /// Roots the trees would have after `tx`, leaving them unchanged.
    pub fn speculative_roots(
        &self,
        txn: &mut (impl WriteTxn + ?Sized),
        tx: &Transaction,
    ) -> Result<([u8; 32], [u8; 32]), LedgerError> {
        let spent = self.apply_to_trees(txn, tx)?;
        let roots = self.roots(txn)?;
        self.undo_trees(txn, &spent, tx.outputs.len() as u64)?;
        Ok(roots)
    }

    fn set_state(
        &self,
        txn: &mut (impl WriteTxn + ?Sized),
        state: &Hash256,
    ) -> Result<(), LedgerError> {
        self.commitments.set_state(txn, state.as_bytes())?;
        self.outputs.set_state(txn, state.as_bytes())?;
        Ok(())
    }

    fn apply_to_trees(
        &self,
        txn: &mut (impl WriteTxn + ?Sized),
        tx: &Transaction,
    ) -> Result<Vec<SpentOutput>, LedgerError> {
        let mut spent = Vec::with_capacity(tx.inputs.len());
        for input in &tx.inputs {
            let index = input.index();
            if !self.is_unspent(txn, &index)? {
                return Err(LedgerError::UnknownInput(index.to_string()));
            }
            let key = index.to_bytes();
            let commitment = self.commitments.clear(txn, &key)?;
            let output = self.outputs.discard(txn, &key)?;
            spent.push(SpentOutput { commitment, output });
        }
        for output in &tx.outputs {
            let index = output.index();
            let key = index.to_bytes();
            if self.was_confirmed(txn, &index)? {
                return Err(LedgerError::DuplicateOutput(index.to_string()));
            }
            self.commitments.append(txn, &key, &[])?;
            self.outputs.append(txn, &key, &codec::encode(output))?;
        }
        Ok(spent)
    }

    fn undo_trees(
        &self,
        txn: &mut (impl WriteTxn + ?Sized),
        spent: &[SpentOutput],
        added: u64,
    ) -> Result<Vec<Output>, LedgerError> {
        self.commitments.remove(txn, added, None)?;
        let removed = self.outputs.remove(txn, added, None)?;
        for record in spent.iter().rev() {
            self.outputs.revert_discarding(txn, &record.output)?;
            self.commitments.revert_clearing(txn, &record.commitment)?;
        }
        removed
            .into_iter()
            .filter_map(|(_, object)| object)
            .map(|bytes| codec::decode(&bytes))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_crypto::SecretKey;
    use glint_nullables::NullEnvironment;
    use glint_store::Environment;
    use glint_transactions::{coinbase_transaction, OutputRequest, TransactionBuilder};
    use glint_types::{ConsensusParams, NetworkId, Timestamp};

    fn params() -> ConsensusParams {
        ConsensusParams::for_network(NetworkId::Dev)
    }

    #[test]
    fn apply_and_rollback_restore_roots() {
        let env = NullEnvironment::new();
        let ledger = OutputsLedger::new();
        let p = params();
        let (coinbase, coin) = coinbase_transaction(&p, 100, 0, &SecretKey::random()).unwrap();

        let mut txn = env.write_txn().unwrap();
        let a = Hash256::new([1; 32]);
        ledger.apply_tx(&mut txn, &coinbase, &a).unwrap();
        let before = ledger.roots(&txn).unwrap();
        assert!(ledger.is_unspent(&txn, &coin.index()).unwrap());

        let (spend, _) = TransactionBuilder::new(&p)
            .spend(coin.clone())
            .output(OutputRequest::new(100, SecretKey::random()))
            .build()
            .unwrap();
        let speculative = ledger.speculative_roots(&mut txn, &spend).unwrap();
        assert_eq!(ledger.roots(&txn).unwrap(), before);

        let b = Hash256::new([2; 32]);
        let spent = ledger.apply_tx(&mut txn, &spend, &b).unwrap();
        assert_eq!(ledger.roots(&txn).unwrap(), speculative);
        assert!(!ledger.is_unspent(&txn, &coin.index()).unwrap());
        assert!(ledger.get_pruned(&txn, &coin.index()).unwrap().is_some());
        assert_eq!(ledger.state(&txn).unwrap(), b);

        let restored = ledger.rollback(&mut txn, &spent, 1, &a).unwrap();
        assert_eq!(ledger.roots(&txn).unwrap(), before);
        assert_eq!(ledger.state(&txn).unwrap(), a);
        assert!(ledger.is_unspent(&txn, &coin.index()).unwrap());
        assert_eq!(restored, spend.outputs);
        assert!(ledger.pool().is_empty());
    }

    #[test]
    fn spent_input_cannot_be_spent_again() {
        let env = NullEnvironment::new();
        let ledger = OutputsLedger::new();
        let p = params();
        let (coinbase, coin) = coinbase_transaction(&p, 100, 0, &SecretKey::random()).unwrap();
        let mut txn = env.write_txn().unwrap();
        ledger.apply_tx(&mut txn, &coinbase, &Hash256::new([1; 32])).unwrap();
        let (spend, _) = TransactionBuilder::new(&p)
            .spend(coin)
            .output(OutputRequest::new(100, SecretKey::random()))
            .build()
            .unwrap();
        ledger.apply_tx(&mut txn, &spend, &Hash256::new([2; 32])).unwrap();
        assert!(matches!(
            ledger.apply_tx(&mut txn, &spend, &Hash256::new([3; 32])),
            Err(LedgerError::UnknownInput(_))
        ));
    }

    #[test]
    fn duplicate_output_is_refused() {
        let env = NullEnvironment::new();
        let ledger = OutputsLedger::new();
        let (coinbase, _) = coinbase_transaction(&params(), 100, 0, &SecretKey::random()).unwrap();
        let mut txn = env.write_txn().unwrap();
        ledger.apply_tx(&mut txn, &coinbase, &Hash256::new([1; 32])).unwrap();
        assert!(matches!(
            ledger.apply_tx(&mut txn, &coinbase, &Hash256::new([2; 32])),
            Err(LedgerError::DuplicateOutput(_))
        ));
    }

    #[test]
    fn resolve_prefers_live_then_pool() {
        let env = NullEnvironment::new();
        let mut ledger = OutputsLedger::new();
        let (coinbase, coin) = coinbase_transaction(&params(), 5, 0, &SecretKey::random()).unwrap();
        ledger.pool_mut().insert(coin.output.clone(), Timestamp::new(0));
        let txn = env.read_txn().unwrap();
        assert!(ledger.known(&txn, &coin.index()).unwrap());
        assert_eq!(ledger.resolve(&txn, &coin.index()).unwrap(), Some(coin.output.clone()));
        drop(txn);

        let mut txn = env.write_txn().unwrap();
        ledger.apply_tx(&mut txn, &coinbase, &Hash256::new([1; 32])).unwrap();
        assert!(ledger.pool().contains(&coin.index()));
        let hits = ledger.fuzzy_search(&txn, &coin.index().apc.as_bytes()[..4]).unwrap();
        assert_eq!(hits.len(), 1);
        assert!(!hits[0].pruned);
    }
}
