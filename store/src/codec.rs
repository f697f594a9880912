//! Canonical record encoding (bincode, fixed field order).

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{ReadTxn, StoreError, Table, WriteTxn};

pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, StoreError> {
    bincode::serialize(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    bincode::deserialize(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

pub fn get_decoded<T: DeserializeOwned>(
    txn: &(impl ReadTxn + ?Sized),
    table: Table,
    key: &[u8],
) -> Result<Option<T>, StoreError> {
    txn.get(table, key)?.map(|bytes| decode(&bytes)).transpose()
}

pub fn put_encoded<T: Serialize + ?Sized>(
    txn: &mut (impl WriteTxn + ?Sized),
    table: Table,
    key: &[u8],
    value: &T,
) -> Result<(), StoreError> {
    txn.put(table, key, &encode(value)?)
}
