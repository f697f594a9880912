//! The undo log: one rollback object per applied block.

use serde::{Deserialize, Serialize};

use glint_store::{get_decoded, put_encoded, ReadTxn, Table, WriteTxn};
use glint_transactions::OutputIndex;
use glint_types::Hash256;

use crate::outputs::SpentOutput;
use crate::LedgerError;

/// Everything needed to undo one block application.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollBack {
    /// Ledger state id before the block.
    pub prev_state: Hash256,
    /// Spent inputs in spend order.
    pub spent: Vec<SpentOutput>,
    pub added_outputs: u64,
    pub added_excesses: u64,
    /// Outputs whose burden record the block created.
    pub burdens_added: Vec<OutputIndex>,
    /// Burden records the block consumed by spending their outputs.
    pub burdens_spent: Vec<(OutputIndex, [u8; 32])>,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RollbackStore;

impl RollbackStore {
    pub fn contains(
        &self,
        txn: &(impl ReadTxn + ?Sized),
        block: &Hash256,
    ) -> Result<bool, LedgerError> {
        Ok(txn.exists(Table::Rollbacks, block.as_bytes())?)
    }

    pub fn get(
        &self,
        txn: &(impl ReadTxn + ?Sized),
        block: &Hash256,
    ) -> Result<Option<RollBack>, LedgerError> {
        Ok(get_decoded(txn, Table::Rollbacks, block.as_bytes())?)
    }

    pub fn put(
        &self,
        txn: &mut (impl WriteTxn + ?Sized),
        block: &Hash256,
        rollback: &RollBack,
    ) -> Result<(), LedgerError> {
        put_encoded(txn, Table::Rollbacks, block.as_bytes(), rollback)?;
        Ok(())
    }

    /// Remove and return the rollback object of `block`; its absence is fatal.
    pub fn take(
        &self,
        txn: &mut (impl WriteTxn + ?Sized),
        block: &Hash256,
    ) -> Result<RollBack, LedgerError> {
        let rollback = self
            .get(txn, block)?
            .ok_or_else(|| LedgerError::MissingRollback(block.to_string()))?;
        txn.delete(Table::Rollbacks, block.as_bytes())?;
        Ok(rollback)
    }
}
