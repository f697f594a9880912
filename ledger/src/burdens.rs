//! Burden records of confirmed outputs.
//!
//! Only the hash check is consensus today; evaluating scripts carried in
//! excess messages is left for a later extension.

use glint_store::{ReadTxn, Table, WriteTxn};
use glint_transactions::OutputIndex;

use crate::LedgerError;

#[derive(Clone, Copy, Debug, Default)]
pub struct BurdenStore;

impl BurdenStore {
    pub fn get(
        &self,
        txn: &(impl ReadTxn + ?Sized),
        output: &OutputIndex,
    ) -> Result<Option<[u8; 32]>, LedgerError> {
        match txn.get(Table::Burdens, &output.to_bytes())? {
            Some(bytes) => Ok(Some(bytes.as_slice().try_into().map_err(|_| {
                LedgerError::Malformed(format!("burden of {} bytes", bytes.len()))
            })?)),
            None => Ok(None),
        }
    }

    pub fn put(
        &self,
        txn: &mut (impl WriteTxn + ?Sized),
        output: &OutputIndex,
        burden: &[u8; 32],
    ) -> Result<(), LedgerError> {
        txn.put(Table::Burdens, &output.to_bytes(), burden)?;
        Ok(())
    }

    pub fn remove(
        &self,
        txn: &mut (impl WriteTxn + ?Sized),
        output: &OutputIndex,
    ) -> Result<bool, LedgerError> {
        Ok(txn.delete(Table::Burdens, &output.to_bytes())?)
    }
}
