//! The ledger facade: output and excess accumulators plus the stores around them.

use glint_store::{ReadTxn, WriteTxn};
use glint_transactions::{Output, OutputIndex, Transaction, TransactionSkeleton};
use glint_types::{Hash256, Timestamp};
use tracing::debug;

use crate::block_store::BlockStore;
use crate::burdens::BurdenStore;
use crate::excesses::ExcessesLedger;
use crate::header::MerkleRoots;
use crate::header_store::HeaderStore;
use crate::outputs::OutputsLedger;
use crate::pool::ProvisionalPool;
use crate::rollback::{RollBack, RollbackStore};
use crate::LedgerError;

/// Result of resolving a skeleton against local data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Materialized {
    Complete(Transaction),
    /// Outputs that still have to be downloaded.
    Missing(Vec<OutputIndex>),
}

#[derive(Default)]
pub struct Ledger {
    outputs: OutputsLedger,
    excesses: ExcessesLedger,
    burdens: BurdenStore,
    headers: HeaderStore,
    blocks: BlockStore,
    rollbacks: RollbackStore,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pool(pool: ProvisionalPool) -> Self {
        Self {
            outputs: OutputsLedger::with_pool(pool),
            ..Self::default()
        }
    }

    pub fn outputs(&self) -> &OutputsLedger {
        &self.outputs
    }

    pub fn outputs_mut(&mut self) -> &mut OutputsLedger {
        &mut self.outputs
    }

    pub fn excesses(&self) -> &ExcessesLedger {
        &self.excesses
    }

    pub fn burdens(&self) -> &BurdenStore {
        &self.burdens
    }

    pub fn headers(&self) -> &HeaderStore {
        &self.headers
    }

    pub fn blocks(&self) -> &BlockStore {
        &self.blocks
    }

    pub fn rollbacks(&self) -> &RollbackStore {
        &self.rollbacks
    }

    /// The block after which the ledger is in its current state.
    ///
    /// The output and excess trees must agree; anything else is corruption.
    pub fn current_tip(&self, txn: &(impl ReadTxn + ?Sized)) -> Result<Hash256, LedgerError> {
        let outputs = self.outputs.state(txn)?;
        let excesses = self.excesses.state(txn)?;
        if outputs != excesses {
            return Err(LedgerError::StateMismatch {
                outputs: outputs.to_string(),
                excesses: excesses.to_string(),
            });
        }
        Ok(outputs)
    }

    pub fn roots(&self, txn: &(impl ReadTxn + ?Sized)) -> Result<MerkleRoots, LedgerError> {
        let (commitment, output) = self.outputs.roots(txn)?;
        let excess = self.excesses.root(txn)?;
        MerkleRoots::from_roots(&commitment, &output, &excess)
    }

    /// Roots the ledger would have after `tx`. Leaves every tree as it was,
    /// but a failure leaves `txn` dirty and the caller must abort it.
    pub fn speculative_roots(
        &self,
        txn: &mut (impl WriteTxn + ?Sized),
        tx: &Transaction,
    ) -> Result<MerkleRoots, LedgerError> {
        let (commitment, output) = self.outputs.speculative_roots(txn, tx)?;
        let excess = self.excesses.speculative_root(txn, tx)?;
        MerkleRoots::from_roots(&commitment, &output, &excess)
    }

    /// Apply `tx` for real and return the object that undoes it.
    pub fn apply_tx(
        &mut self,
        txn: &mut (impl WriteTxn + ?Sized),
        tx: &Transaction,
        state: &Hash256,
    ) -> Result<RollBack, LedgerError> {
        let prev_state = self.current_tip(txn)?;

        let mut burdens_spent = Vec::new();
        for input in &tx.inputs {
            let index = input.index();
            if let Some(burden) = self.burdens.get(txn, &index)? {
                self.burdens.remove(txn, &index)?;
                burdens_spent.push((index, burden));
            }
        }

        let spent = self.outputs.apply_tx(txn, tx, state)?;
        let added_excesses = self.excesses.apply_tx(txn, tx, state)?;

        let mut burdens_added = Vec::new();
        for output in &tx.outputs {
            if let Some(burden) = output.burden {
                let index = output.index();
                self.burdens.put(txn, &index, &burden)?;
                burdens_added.push(index);
            }
        }

        debug!(
            state = %state,
            inputs = tx.inputs.len(),
            outputs = tx.outputs.len(),
            excesses = added_excesses,
            "applied transaction to ledger"
        );
        Ok(RollBack {
            prev_state,
            spent,
            added_outputs: tx.outputs.len() as u64,
            added_excesses,
            burdens_added,
            burdens_spent,
        })
    }

    /// Exact inverse of [`Ledger::apply_tx`] on the stored state. Returns the
    /// outputs the rolled back transaction had confirmed; hand them to
    /// [`Ledger::restore_provisional`] after `txn` commits.
    pub fn rollback(
        &mut self,
        txn: &mut (impl WriteTxn + ?Sized),
        rollback: &RollBack,
    ) -> Result<Vec<Output>, LedgerError> {
        for index in &rollback.burdens_added {
            self.burdens.remove(txn, index)?;
        }
        for (index, burden) in &rollback.burdens_spent {
            self.burdens.put(txn, index, burden)?;
        }
        self.excesses
            .rollback(txn, rollback.added_excesses, &rollback.prev_state)?;
        let restored = self.outputs.rollback(
            txn,
            &rollback.spent,
            rollback.added_outputs,
            &rollback.prev_state,
        )?;
        debug!(state = %rollback.prev_state, "rolled ledger back");
        Ok(restored)
    }

    /// Rebuild the full transaction of a skeleton from confirmed, pooled
    /// and archived outputs.
    pub fn materialize(
        &self,
        txn: &(impl ReadTxn + ?Sized),
        skeleton: &TransactionSkeleton,
    ) -> Result<Materialized, LedgerError> {
        let mut failure = None;
        let result = skeleton.materialize(|index| match self.outputs.resolve(txn, index) {
            Ok(found) => found,
            Err(e) => {
                failure.get_or_insert(e);
                None
            }
        });
        if let Some(e) = failure {
            return Err(e);
        }
        Ok(match result {
            Ok(tx) => Materialized::Complete(tx),
            Err(missing) => Materialized::Missing(missing),
        })
    }

    /// Accept an output delivered by a peer into the provisional pool.
    pub fn add_provisional(&mut self, output: Output, now: Timestamp) -> bool {
        self.outputs.pool_mut().insert(output, now)
    }

    /// Drop what `tx` confirmed from the pool. Only call once the storage
    /// transaction that applied `tx` has committed.
    pub fn confirm_provisional(&mut self, tx: &Transaction) {
        let pool = self.outputs.pool_mut();
        for output in &tx.outputs {
            pool.remove(&output.index());
        }
    }

    /// Pool the outputs a committed rollback took out of the trees.
    pub fn restore_provisional(&mut self, outputs: Vec<Output>, now: Timestamp) {
        let pool = self.outputs.pool_mut();
        for output in outputs {
            pool.insert(output, now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_crypto::{keypair_from_seed, SecretKey};
    use glint_nullables::NullEnvironment;
    use glint_store::Environment;
    use glint_transactions::{coinbase_transaction, Excess, OutputRequest, TransactionBuilder};
    use glint_types::{ConsensusParams, NetworkId};

    fn params() -> ConsensusParams {
        ConsensusParams::for_network(NetworkId::Dev)
    }

    #[test]
    fn roots_balance_with_supply() {
        let env = NullEnvironment::new();
        let mut ledger = Ledger::new();
        let p = params();
        let (coinbase, coin) = coinbase_transaction(&p, 1_000_000, 0, &SecretKey::random()).unwrap();

        let mut txn = env.write_txn().unwrap();
        ledger.apply_tx(&mut txn, &coinbase, &Hash256::new([1; 32])).unwrap();
        let roots = ledger.roots(&txn).unwrap();
        assert!(roots.balances_with(1_000_000));

        let fee = p.output_creation_fee;
        let (spend, _) = TransactionBuilder::new(&p)
            .spend(coin)
            .output(OutputRequest::new(400_000, SecretKey::random()))
            .output(OutputRequest::new(600_000 - fee, SecretKey::random()))
            .build()
            .unwrap();
        ledger.apply_tx(&mut txn, &spend, &Hash256::new([2; 32])).unwrap();
        assert!(ledger.roots(&txn).unwrap().balances_with(1_000_000 - fee));
    }

    #[test]
    fn rollback_round_trip_restores_everything() {
        let env = NullEnvironment::new();
        let mut ledger = Ledger::new();
        let p = params();
        let burden_key = keypair_from_seed(b"lock");
        let (coinbase, coin) = coinbase_transaction(&p, 1_000, 0, &SecretKey::random()).unwrap();

        let mut txn = env.write_txn().unwrap();
        let first = Hash256::new([1; 32]);
        ledger.apply_tx(&mut txn, &coinbase, &first).unwrap();
        let before = ledger.roots(&txn).unwrap();

        let (locked, created) = TransactionBuilder::new(&p)
            .spend(coin.clone())
            .output(
                OutputRequest::new(1_000, SecretKey::random())
                    .with_burden(Excess::burden_hash(&burden_key.public)),
            )
            .build()
            .unwrap();
        let rollback = ledger
            .apply_tx(&mut txn, &locked, &Hash256::new([2; 32]))
            .unwrap();
        assert_eq!(rollback.prev_state, first);
        assert!(ledger.burdens().get(&txn, &created[0].index()).unwrap().is_some());

        ledger.rollback(&mut txn, &rollback).unwrap();
        assert_eq!(ledger.current_tip(&txn).unwrap(), first);
        assert_eq!(ledger.roots(&txn).unwrap(), before);
        assert!(ledger.burdens().get(&txn, &created[0].index()).unwrap().is_none());
        assert!(ledger.outputs().is_unspent(&txn, &coin.index()).unwrap());
    }

    #[test]
    fn materialize_reports_missing_outputs() {
        let env = NullEnvironment::new();
        let mut ledger = Ledger::new();
        let p = params();
        let (coinbase, coin) = coinbase_transaction(&p, 1_000, 0, &SecretKey::random()).unwrap();
        let (spend, _) = TransactionBuilder::new(&p)
            .spend(coin)
            .output(OutputRequest::new(1_000, SecretKey::random()))
            .build()
            .unwrap();

        let mut txn = env.write_txn().unwrap();
        ledger.apply_tx(&mut txn, &coinbase, &Hash256::new([1; 32])).unwrap();
        let skeleton = spend.skeleton();
        assert_eq!(
            ledger.materialize(&txn, &skeleton).unwrap(),
            Materialized::Missing(spend.output_indexes())
        );

        ledger.add_provisional(spend.outputs[0].clone(), Timestamp::new(0));
        assert_eq!(
            ledger.materialize(&txn, &skeleton).unwrap(),
            Materialized::Complete(spend)
        );
    }

    #[test]
    fn aborted_apply_leaves_pool_untouched() {
        let env = NullEnvironment::new();
        let mut ledger = Ledger::new();
        let (coinbase, coin) = coinbase_transaction(&params(), 1_000, 0, &SecretKey::random()).unwrap();
        ledger.add_provisional(coin.output.clone(), Timestamp::new(0));

        let mut txn = env.write_txn().unwrap();
        ledger.apply_tx(&mut txn, &coinbase, &Hash256::new([1; 32])).unwrap();
        drop(txn);

        assert!(ledger.outputs().pool().contains(&coin.index()));
        let txn = env.read_txn().unwrap();
        assert!(!ledger.outputs().is_unspent(&txn, &coin.index()).unwrap());
        assert_eq!(
            ledger.outputs().resolve(&txn, &coin.index()).unwrap(),
            Some(coin.output.clone())
        );
        drop(txn);

        let mut txn = env.write_txn().unwrap();
        ledger.apply_tx(&mut txn, &coinbase, &Hash256::new([1; 32])).unwrap();
        txn.commit().unwrap();
        ledger.confirm_provisional(&coinbase);
        assert!(ledger.outputs().pool().is_empty());
    }

    #[test]
    fn rollback_pools_outputs_only_when_restored() {
        let env = NullEnvironment::new();
        let mut ledger = Ledger::new();
        let p = params();
        let (coinbase, coin) = coinbase_transaction(&p, 1_000, 0, &SecretKey::random()).unwrap();
        let (spend, _) = TransactionBuilder::new(&p)
            .spend(coin)
            .output(OutputRequest::new(1_000, SecretKey::random()))
            .build()
            .unwrap();

        let mut txn = env.write_txn().unwrap();
        ledger.apply_tx(&mut txn, &coinbase, &Hash256::new([1; 32])).unwrap();
        let undo = ledger.apply_tx(&mut txn, &spend, &Hash256::new([2; 32])).unwrap();
        txn.commit().unwrap();

        let mut txn = env.write_txn().unwrap();
        let restored = ledger.rollback(&mut txn, &undo).unwrap();
        drop(txn);
        assert!(ledger.outputs().pool().is_empty());
        let txn = env.read_txn().unwrap();
        assert!(ledger.outputs().is_unspent(&txn, &spend.outputs[0].index()).unwrap());
        drop(txn);

        let mut txn = env.write_txn().unwrap();
        assert_eq!(ledger.rollback(&mut txn, &undo).unwrap(), restored);
        txn.commit().unwrap();
        ledger.restore_provisional(restored, Timestamp::new(5));
        assert!(ledger.outputs().pool().contains(&spend.outputs[0].index()));
    }

    #[test]
    fn diverged_trees_are_a_consistency_fault() {
        let env = NullEnvironment::new();
        let mut ledger = Ledger::new();
        let (coinbase, _) = coinbase_transaction(&params(), 1, 0, &SecretKey::random()).unwrap();
        let mut txn = env.write_txn().unwrap();
        ledger
            .outputs_mut()
            .apply_tx(&mut txn, &coinbase, &Hash256::new([7; 32]))
            .unwrap();
        let err = ledger.current_tip(&txn).unwrap_err();
        assert!(err.is_consistency_fault());
    }
}
