//! Every excess key the chain has accepted, summed as points and hashed.
//!
//! Each confirmed output contributes its address excess with an empty
//! payload; additional excesses are stored in full. Nothing is ever pruned.

use glint_mmr::{Mmr, MmrError, PointHashSum, PruneMode};
use glint_store::{ReadTxn, WriteTxn};
use glint_transactions::{Excess, ExcessIndex, Transaction};
use glint_types::Hash256;

use crate::codec;
use crate::LedgerError;

pub const EXCESS_TREE: u8 = 3;

pub struct ExcessesLedger {
    excesses: Mmr<PointHashSum>,
}

impl Default for ExcessesLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// Entries a transaction adds, in append order.
fn entries(tx: &Transaction) -> Vec<(ExcessIndex, Vec<u8>)> {
    let addresses = tx.outputs.iter().map(|o| (o.address.index(), Vec::new()));
    let additional = tx
        .additional_excesses
        .iter()
        .map(|e| (e.index(), codec::encode(e)));
    addresses.chain(additional).collect()
}

impl ExcessesLedger {
    pub fn new() -> Self {
        Self {
            excesses: Mmr::new(EXCESS_TREE, "excesses", PruneMode::Neither, PointHashSum),
        }
    }

    pub fn contains(
        &self,
        txn: &(impl ReadTxn + ?Sized),
        index: &ExcessIndex,
    ) -> Result<bool, LedgerError> {
        Ok(self.excesses.find_by_hash(txn, &index.to_bytes())?.is_some())
    }

    /// An additional excess; `None` for unknown indexes and address entries.
    pub fn get(
        &self,
        txn: &(impl ReadTxn + ?Sized),
        index: &ExcessIndex,
    ) -> Result<Option<Excess>, LedgerError> {
        match self.excesses.get_by_hash(txn, &index.to_bytes())? {
            Some(bytes) if !bytes.is_empty() => Ok(Some(codec::decode(&bytes)?)),
            _ => Ok(None),
        }
    }

    pub fn count(&self, txn: &(impl ReadTxn + ?Sized)) -> Result<u64, LedgerError> {
        Ok(self.excesses.count(txn)?)
    }

    pub fn root(&self, txn: &(impl ReadTxn + ?Sized)) -> Result<[u8; 64], LedgerError> {
        let root = self.excesses.get_root(txn)?;
        root.as_slice().try_into().map_err(|_| {
            LedgerError::Mmr(MmrError::Corrupted(format!("excess root of {} bytes", root.len())))
        })
    }

    pub fn state(&self, txn: &(impl ReadTxn + ?Sized)) -> Result<Hash256, LedgerError> {
        Ok(Hash256::new(self.excesses.get_state(txn)?))
    }

    /// Append the excesses of `tx`; returns how many entries were added.
    pub fn apply_tx(
        &self,
        txn: &mut (impl WriteTxn + ?Sized),
        tx: &Transaction,
        state: &Hash256,
    ) -> Result<u64, LedgerError> {
        let added = self.append_entries(txn, tx)?;
        self.excesses.set_state(txn, state.as_bytes())?;
        Ok(added)
    }

    pub fn rollback(
        &self,
        txn: &mut (impl WriteTxn + ?Sized),
        added: u64,
        prev_state: &Hash256,
    ) -> Result<(), LedgerError> {
        self.excesses.remove(txn, added, None)?;
        self.excesses.set_state(txn, prev_state.as_bytes())?;
        Ok(())
    }

    /// Root after `tx`, leaving the tree unchanged.
    pub fn speculative_root(
        &self,
        txn: &mut (impl WriteTxn + ?Sized),
        tx: &Transaction,
    ) -> Result<[u8; 64], LedgerError> {
        let added = self.append_entries(txn, tx)?;
        let root = self.root(txn)?;
        self.excesses.remove(txn, added, None)?;
        Ok(root)
    }

    fn append_entries(
        &self,
        txn: &mut (impl WriteTxn + ?Sized),
        tx: &Transaction,
    ) -> Result<u64, LedgerError> {
        let entries = entries(tx);
        for (index, object) in &entries {
            match self.excesses.append_unique(txn, &index.to_bytes(), object) {
                Ok(_) => {}
                Err(MmrError::DuplicateIndex(_)) => {
                    return Err(LedgerError::DuplicateExcess(index.to_string()))
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(entries.len() as u64)
    }
}
