//! Nullable store: an in-memory [`Environment`] with snapshot isolation.
//!
//! A write transaction works on a private copy of every table and swaps it in
//! on commit; readers keep the snapshot they started with.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use glint_store::{Environment, ReadTxn, StoreError, Table, WriteTxn};

type Tables = BTreeMap<Table, BTreeMap<Vec<u8>, Vec<u8>>>;

#[derive(Default)]
pub struct NullEnvironment {
    committed: RwLock<Arc<Tables>>,
    writer: Mutex<()>,
}

impl NullEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot(&self) -> Result<Arc<Tables>, StoreError> {
        self.committed
            .read()
            .map(|guard| Arc::clone(&guard))
            .map_err(|_| StoreError::Backend("null environment lock poisoned".to_string()))
    }
}

fn get(tables: &Tables, table: Table, key: &[u8]) -> Option<Vec<u8>> {
    tables.get(&table).and_then(|t| t.get(key)).cloned()
}

fn prefix_scan(tables: &Tables, table: Table, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
    let Some(t) = tables.get(&table) else {
        return Vec::new();
    };
    t.range(prefix.to_vec()..)
        .take_while(|(k, _)| k.starts_with(prefix))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

pub struct NullReadTxn {
    snapshot: Arc<Tables>,
}

impl ReadTxn for NullReadTxn {
    fn get(&self, table: Table, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(get(&self.snapshot, table, key))
    }

    fn prefix_scan(
        &self,
        table: Table,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        Ok(prefix_scan(&self.snapshot, table, prefix))
    }
}

pub struct NullWriteTxn<'a> {
    env: &'a NullEnvironment,
    working: Tables,
    _writer: MutexGuard<'a, ()>,
}

impl ReadTxn for NullWriteTxn<'_> {
    fn get(&self, table: Table, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(get(&self.working, table, key))
    }

    fn prefix_scan(
        &self,
        table: Table,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        Ok(prefix_scan(&self.working, table, prefix))
    }
}

impl WriteTxn for NullWriteTxn<'_> {
    fn put(&mut self, table: Table, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.working
            .entry(table)
            .or_default()
            .insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, table: Table, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self
            .working
            .get_mut(&table)
            .map(|t| t.remove(key).is_some())
            .unwrap_or(false))
    }

    fn commit(self) -> Result<(), StoreError> {
        let mut committed = self
            .env
            .committed
            .write()
            .map_err(|_| StoreError::Backend("null environment lock poisoned".to_string()))?;
        *committed = Arc::new(self.working);
        Ok(())
    }
}

impl Environment for NullEnvironment {
    type Read<'a> = NullReadTxn;
    type Write<'a> = NullWriteTxn<'a>;

    fn read_txn(&self) -> Result<Self::Read<'_>, StoreError> {
        Ok(NullReadTxn {
            snapshot: self.snapshot()?,
        })
    }

    fn write_txn(&self) -> Result<Self::Write<'_>, StoreError> {
        let writer = self
            .writer
            .lock()
            .map_err(|_| StoreError::Backend("null environment writer poisoned".to_string()))?;
        let working = (*self.snapshot()?).clone();
        Ok(NullWriteTxn {
            env: self,
            working,
            _writer: writer,
        })
    }
}
