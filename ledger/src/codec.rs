//! Canonical encoding of headers and ledger records.

use serde::de::DeserializeOwned;
use serde::Serialize;

use glint_transactions::codec::canonical_bytes;

use crate::LedgerError;

pub fn encode<T: Serialize + ?Sized>(value: &T) -> Vec<u8> {
    canonical_bytes(value)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, LedgerError> {
    bincode::deserialize(bytes).map_err(|e| LedgerError::Malformed(e.to_string()))
}
