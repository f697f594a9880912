//! Blocks keyed by header hash.

use glint_store::{get_decoded, put_encoded, ReadTxn, Table, WriteTxn};
use glint_types::Hash256;

use crate::block::ContextBlock;
use crate::LedgerError;

#[derive(Clone, Copy, Debug, Default)]
pub struct BlockStore;

impl BlockStore {
    pub fn get(
        &self,
        txn: &(impl ReadTxn + ?Sized),
        hash: &Hash256,
    ) -> Result<Option<ContextBlock>, LedgerError> {
        Ok(get_decoded(txn, Table::Blocks, hash.as_bytes())?)
    }

    pub fn contains(
        &self,
        txn: &(impl ReadTxn + ?Sized),
        hash: &Hash256,
    ) -> Result<bool, LedgerError> {
        Ok(txn.exists(Table::Blocks, hash.as_bytes())?)
    }

    pub fn put(
        &self,
        txn: &mut (impl WriteTxn + ?Sized),
        block: &ContextBlock,
    ) -> Result<(), LedgerError> {
        put_encoded(txn, Table::Blocks, block.hash().as_bytes(), block)?;
        Ok(())
    }

    /// Flag a stored block invalid; unknown hashes are ignored.
    pub fn mark_invalid(
        &self,
        txn: &mut (impl WriteTxn + ?Sized),
        hash: &Hash256,
        reason: &str,
    ) -> Result<(), LedgerError> {
        if let Some(mut block) = self.get(txn, hash)? {
            if !block.invalid {
                block.invalid = true;
                block.reason = Some(reason.to_string());
                self.put(txn, &block)?;
            }
        }
        Ok(())
    }
}
