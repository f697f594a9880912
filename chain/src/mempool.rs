//! Pending transactions and the merged transaction offered to miners.
//!
//! Selection is greedy: skeletons spending more inputs are tried first,
//! ties broken by id. A transaction that conflicts with one already merged
//! sits out the round but stays pooled. Transactions that can never be
//! mined again are dropped.

use std::collections::HashMap;

use tracing::debug;

use glint_ledger::{ExpiringCache, Ledger, Materialized};
use glint_store::ReadTxn;
use glint_transactions::{Transaction, TransactionSkeleton, VerifyMode};
use glint_types::{ConsensusParams, Hash256, Timestamp};

use crate::validation::{input_violation, novelty_violation, VerificationCache};
use crate::ChainError;

/// Where a pooled transaction stands against the current ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fate {
    /// Mergeable into the next block.
    Ready,
    /// Depends on something not confirmed or not mature yet.
    Wait,
    /// Can never be mined on this chain.
    Drop(String),
}

/// Classify a built transaction for the block at `height`.
pub fn fate(
    ledger: &Ledger,
    txn: &(impl ReadTxn + ?Sized),
    params: &ConsensusParams,
    tx: &Transaction,
    skeleton_size: usize,
    height: u64,
) -> Result<Fate, ChainError> {
    match tx.relay_fee() {
        Ok(fee) if fee >= params.min_relay_fee(skeleton_size) => {}
        Ok(fee) => return Ok(Fate::Drop(format!("relay fee {fee} below policy"))),
        Err(e) => return Ok(Fate::Drop(e.to_string())),
    }
    if let Some(reason) = novelty_violation(ledger, txn, tx)? {
        return Ok(Fate::Drop(reason));
    }
    for input in &tx.inputs {
        let index = input.index();
        if !ledger.outputs().is_unspent(txn, &index)? {
            if ledger.outputs().pool().contains(&index) {
                return Ok(Fate::Wait);
            }
            return Ok(Fate::Drop(format!("input {index} is spent")));
        }
        if input.lock_height > height {
            return Ok(Fate::Wait);
        }
    }
    if let Some(reason) = input_violation(ledger, txn, tx, height, false)? {
        return Ok(Fate::Drop(reason));
    }
    Ok(Fate::Ready)
}

pub struct Mempool {
    skeletons: HashMap<Hash256, TransactionSkeleton>,
    built: ExpiringCache<Hash256, Transaction>,
    combined: Transaction,
    included: Vec<Hash256>,
    capacity: usize,
}

impl Mempool {
    pub fn new(capacity: usize, build_ttl_secs: u64) -> Self {
        Self {
            skeletons: HashMap::new(),
            built: ExpiringCache::new(build_ttl_secs, capacity),
            combined: Transaction::default(),
            included: Vec::new(),
            capacity,
        }
    }

    /// Pool a skeleton. Checking it is the caller's business.
    pub fn insert(&mut self, skeleton: TransactionSkeleton) -> Result<Hash256, ChainError> {
        let id = skeleton.id();
        if self.skeletons.contains_key(&id) {
            return Err(ChainError::DuplicateTransaction(id));
        }
        if self.skeletons.len() >= self.capacity {
            return Err(ChainError::Violation("mempool is full".into()));
        }
        self.skeletons.insert(id, skeleton);
        Ok(id)
    }

    pub fn contains(&self, id: &Hash256) -> bool {
        self.skeletons.contains_key(id)
    }

    pub fn get(&self, id: &Hash256) -> Option<&TransactionSkeleton> {
        self.skeletons.get(id)
    }

    pub fn remove(&mut self, id: &Hash256) -> Option<TransactionSkeleton> {
        self.built.remove(id);
        self.skeletons.remove(id)
    }

    pub fn len(&self) -> usize {
        self.skeletons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skeletons.is_empty()
    }

    /// The merged transaction of the last [`Mempool::update_current_set`].
    pub fn combined_tx(&self) -> &Transaction {
        &self.combined
    }

    /// Ids merged into [`Mempool::combined_tx`].
    pub fn included(&self) -> &[Hash256] {
        &self.included
    }

    /// Rebuild the merged transaction for the block at `height`.
    pub fn update_current_set(
        &mut self,
        ledger: &Ledger,
        txn: &(impl ReadTxn + ?Sized),
        params: &ConsensusParams,
        height: u64,
        cache: &mut VerificationCache,
        now: Timestamp,
    ) -> Result<(), ChainError> {
        let mut order: Vec<(usize, Hash256)> = self
            .skeletons
            .iter()
            .map(|(id, s)| (s.input_indexes.len(), *id))
            .collect();
        order.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        let mut combined = Transaction::default();
        let mut included = Vec::new();
        let mut dropped = Vec::new();
        for (_, id) in order {
            let Some(skeleton) = self.skeletons.get(&id) else {
                continue;
            };
            let size = skeleton.size();
            let tx = match self.built.get(&id, now) {
                Some(tx) => tx.clone(),
                None => match ledger.materialize(txn, skeleton)? {
                    Materialized::Missing(_) => continue,
                    Materialized::Complete(tx) => {
                        if let Err(e) = cache.verify(&tx, params, VerifyMode::Standalone, now) {
                            dropped.push((id, e.to_string()));
                            continue;
                        }
                        self.built.insert(id, tx.clone(), now);
                        tx
                    }
                },
            };
            match fate(ledger, txn, params, &tx, size, height)? {
                Fate::Ready => {}
                Fate::Wait => continue,
                Fate::Drop(reason) => {
                    dropped.push((id, reason));
                    continue;
                }
            }
            match combined.merge(&tx) {
                Ok(merged) => {
                    combined = merged;
                    included.push(id);
                }
                Err(e) => debug!(id = %id, error = %e, "transaction sits out this round"),
            }
        }

        for (id, reason) in dropped {
            debug!(id = %id, %reason, "dropping pooled transaction");
            self.remove(&id);
        }
        self.combined = combined;
        self.included = included;
        Ok(())
    }
}
