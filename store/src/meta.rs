//! Schema version and other bookkeeping in the [`Table::Meta`] table.

use crate::{ReadTxn, StoreError, Table, WriteTxn};

const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

/// Stored schema version; zero for a fresh database.
pub fn schema_version(txn: &(impl ReadTxn + ?Sized)) -> Result<u32, StoreError> {
    match txn.get(Table::Meta, SCHEMA_VERSION_KEY)? {
        Some(bytes) => {
            let arr: [u8; 4] = bytes.as_slice().try_into().map_err(|_| {
                StoreError::Corruption("schema_version has unexpected byte length".to_string())
            })?;
            Ok(u32::from_le_bytes(arr))
        }
        None => Ok(0),
    }
}

pub fn set_schema_version(
    txn: &mut (impl WriteTxn + ?Sized),
    version: u32,
) -> Result<(), StoreError> {
    txn.put(Table::Meta, SCHEMA_VERSION_KEY, &version.to_le_bytes())
}
