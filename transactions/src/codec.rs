//! Canonical encoding of transaction data.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::TransactionError;

/// bincode with fixed field order. Infallible for these types: they hold no
/// maps and no length limit is configured.
pub fn canonical_bytes<T: Serialize + ?Sized>(value: &T) -> Vec<u8> {
    bincode::serialize(value).unwrap_or_default()
}

/// Decode untrusted bytes; any failure is structural.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, TransactionError> {
    bincode::deserialize(bytes).map_err(|e| TransactionError::Malformed(e.to_string()))
}
