//! Persisted headers, the height index, loose ends and the best-tip marker.

use glint_store::{get_decoded, put_encoded, ReadTxn, Table, WriteTxn};
use glint_types::Hash256;

use crate::header::ContextHeader;
use crate::LedgerError;

const BEST_TIP_KEY: &[u8] = b"best_tip";
const MAX_HEIGHT_KEY: &[u8] = b"max_height";

fn height_key(height: u64, hash: &Hash256) -> Vec<u8> {
    let mut key = Vec::with_capacity(40);
    key.extend_from_slice(&height.to_be_bytes());
    key.extend_from_slice(hash.as_bytes());
    key
}

fn pair_key(first: &Hash256, second: &Hash256) -> Vec<u8> {
    let mut key = Vec::with_capacity(64);
    key.extend_from_slice(first.as_bytes());
    key.extend_from_slice(second.as_bytes());
    key
}

fn tail_hash(key: &[u8]) -> Result<Hash256, LedgerError> {
    let start = key
        .len()
        .checked_sub(32)
        .ok_or_else(|| LedgerError::Malformed(format!("index key of {} bytes", key.len())))?;
    Hash256::from_slice(&key[start..]).map_err(|e| LedgerError::Malformed(e.to_string()))
}

#[derive(Clone, Copy, Debug, Default)]
pub struct HeaderStore;

impl HeaderStore {
    pub fn get(
        &self,
        txn: &(impl ReadTxn + ?Sized),
        hash: &Hash256,
    ) -> Result<Option<ContextHeader>, LedgerError> {
        Ok(get_decoded(txn, Table::Headers, hash.as_bytes())?)
    }

    /// Like [`HeaderStore::get`] but a missing header is an error.
    pub fn require(
        &self,
        txn: &(impl ReadTxn + ?Sized),
        hash: &Hash256,
    ) -> Result<ContextHeader, LedgerError> {
        self.get(txn, hash)?
            .ok_or_else(|| LedgerError::UnknownHeader(hash.to_string()))
    }

    pub fn contains(
        &self,
        txn: &(impl ReadTxn + ?Sized),
        hash: &Hash256,
    ) -> Result<bool, LedgerError> {
        Ok(txn.exists(Table::Headers, hash.as_bytes())?)
    }

    /// Insert or overwrite, keeping the height index current. Only headers
    /// connected to genesis raise the maximum height.
    pub fn put(
        &self,
        txn: &mut (impl WriteTxn + ?Sized),
        header: &ContextHeader,
    ) -> Result<(), LedgerError> {
        put_encoded(txn, Table::Headers, header.hash.as_bytes(), header)?;
        txn.put(Table::HeightIndex, &height_key(header.height(), &header.hash), &[])?;
        let raises = self.max_height(txn)?.map_or(true, |max| header.height() > max);
        if header.connected_to_genesis && raises {
            txn.put(Table::Meta, MAX_HEIGHT_KEY, &header.height().to_be_bytes())?;
        }
        Ok(())
    }

    pub fn hashes_at_height(
        &self,
        txn: &(impl ReadTxn + ?Sized),
        height: u64,
    ) -> Result<Vec<Hash256>, LedgerError> {
        txn.prefix_scan(Table::HeightIndex, &height.to_be_bytes())?
            .iter()
            .map(|(key, _)| tail_hash(key))
            .collect()
    }

    /// Highest height of any header connected to genesis.
    pub fn max_height(&self, txn: &(impl ReadTxn + ?Sized)) -> Result<Option<u64>, LedgerError> {
        match txn.get(Table::Meta, MAX_HEIGHT_KEY)? {
            Some(bytes) => {
                let arr: [u8; 8] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| LedgerError::Malformed("max height".to_string()))?;
                Ok(Some(u64::from_be_bytes(arr)))
            }
            None => Ok(None),
        }
    }

    /// Remember `child` until `missing_parent` arrives.
    pub fn add_loose_end(
        &self,
        txn: &mut (impl WriteTxn + ?Sized),
        missing_parent: &Hash256,
        child: &Hash256,
    ) -> Result<(), LedgerError> {
        txn.put(Table::LooseEnds, &pair_key(missing_parent, child), &[])?;
        Ok(())
    }

    /// Children parked under `parent`, removing them from the waiting table.
    pub fn take_loose_ends(
        &self,
        txn: &mut (impl WriteTxn + ?Sized),
        parent: &Hash256,
    ) -> Result<Vec<Hash256>, LedgerError> {
        let entries = txn.prefix_scan(Table::LooseEnds, parent.as_bytes())?;
        let mut children = Vec::with_capacity(entries.len());
        for (key, _) in entries {
            children.push(tail_hash(&key)?);
            txn.delete(Table::LooseEnds, &key)?;
        }
        Ok(children)
    }

    pub fn best_tip(&self, txn: &(impl ReadTxn + ?Sized)) -> Result<Option<Hash256>, LedgerError> {
        match txn.get(Table::Meta, BEST_TIP_KEY)? {
            Some(bytes) => Ok(Some(
                Hash256::from_slice(&bytes).map_err(|e| LedgerError::Malformed(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    pub fn set_best_tip(
        &self,
        txn: &mut (impl WriteTxn + ?Sized),
        hash: &Hash256,
    ) -> Result<(), LedgerError> {
        txn.put(Table::Meta, BEST_TIP_KEY, hash.as_bytes())?;
        Ok(())
    }
}
