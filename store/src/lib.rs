//! Abstract storage contract for the glint consensus core.
//!
//! Every backend (LMDB in production, in-memory for tests) implements
//! [`Environment`]: snapshot read transactions, one atomic write transaction
//! at a time, ordered keys within each [`Table`]. The rest of the codebase
//! depends only on these traits.

pub mod codec;
pub mod error;
pub mod meta;
pub mod table;

pub use codec::{decode, encode, get_decoded, put_encoded};
pub use error::StoreError;
pub use table::Table;

/// A consistent snapshot of every table.
pub trait ReadTxn {
    fn get(&self, table: Table, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// All entries whose key starts with `prefix`, in ascending key order.
    fn prefix_scan(&self, table: Table, prefix: &[u8])
        -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError>;

    fn exists(&self, table: Table, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.get(table, key)?.is_some())
    }

    fn count(&self, table: Table) -> Result<u64, StoreError> {
        Ok(self.prefix_scan(table, &[])?.len() as u64)
    }
}

/// A read-write transaction. Dropping it without [`WriteTxn::commit`] aborts.
pub trait WriteTxn: ReadTxn {
    fn put(&mut self, table: Table, key: &[u8], value: &[u8]) -> Result<(), StoreError>;

    /// Returns whether the key existed.
    fn delete(&mut self, table: Table, key: &[u8]) -> Result<bool, StoreError>;

    fn commit(self) -> Result<(), StoreError>
    where
        Self: Sized;
}

/// A storage environment handing out transactions.
pub trait Environment: Send + Sync {
    type Read<'a>: ReadTxn
    where
        Self: 'a;
    type Write<'a>: WriteTxn
    where
        Self: 'a;

    fn read_txn(&self) -> Result<Self::Read<'_>, StoreError>;

    fn write_txn(&self) -> Result<Self::Write<'_>, StoreError>;
}
