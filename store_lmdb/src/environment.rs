//! LMDB environment and transactions.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions, RoTxn, RwTxn};

use glint_store::{Environment, ReadTxn, StoreError, Table, WriteTxn};

use crate::LmdbError;

pub const DEFAULT_MAP_SIZE: usize = 16 * 1024 * 1024 * 1024;

type Tables = HashMap<Table, Database<Bytes, Bytes>>;

/// Wraps the LMDB environment and all database handles.
///
/// Prefer [`crate::open_shared`]: LMDB must not be opened twice for the same
/// path within one process.
pub struct LmdbEnvironment {
    env: Env,
    tables: Tables,
    path: PathBuf,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path and create every table.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;
        // SAFETY: the registry in `crate::registry` keeps one `Env` per
        // canonical path, and nothing else in the process maps these files.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(Table::ALL.len() as u32)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let mut tables = HashMap::with_capacity(Table::ALL.len());
        for table in Table::ALL {
            let db: Database<Bytes, Bytes> = env.create_database(&mut wtxn, Some(table.name()))?;
            tables.insert(table, db);
        }
        wtxn.commit()?;

        tracing::info!(path = %path.display(), map_size, "opened LMDB environment");
        Ok(Self {
            env,
            tables,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush committed data to disk.
    pub fn sync(&self) -> Result<(), LmdbError> {
        self.env.force_sync()?;
        Ok(())
    }

    pub(crate) fn env(&self) -> &Env {
        &self.env
    }
}

fn table_db(tables: &Tables, table: Table) -> Result<Database<Bytes, Bytes>, LmdbError> {
    tables
        .get(&table)
        .copied()
        .ok_or(LmdbError::MissingTable(table.name()))
}

fn scan(
    db: Database<Bytes, Bytes>,
    txn: &RoTxn<'_>,
    prefix: &[u8],
) -> Result<Vec<(Vec<u8>, Vec<u8>)>, LmdbError> {
    let mut rows = Vec::new();
    if prefix.is_empty() {
        for item in db.iter(txn)? {
            let (k, v) = item?;
            rows.push((k.to_vec(), v.to_vec()));
        }
    } else {
        for item in db.prefix_iter(txn, prefix)? {
            let (k, v) = item?;
            rows.push((k.to_vec(), v.to_vec()));
        }
    }
    Ok(rows)
}

pub struct LmdbReadTxn<'a> {
    txn: RoTxn<'a>,
    tables: &'a Tables,
}

impl ReadTxn for LmdbReadTxn<'_> {
    fn get(&self, table: Table, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let db = table_db(self.tables, table)?;
        let value = db.get(&self.txn, key).map_err(LmdbError::from)?;
        Ok(value.map(<[u8]>::to_vec))
    }

    fn prefix_scan(
        &self,
        table: Table,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let db = table_db(self.tables, table)?;
        Ok(scan(db, &self.txn, prefix)?)
    }
}

pub struct LmdbWriteTxn<'a> {
    txn: RwTxn<'a>,
    tables: &'a Tables,
}

impl ReadTxn for LmdbWriteTxn<'_> {
    fn get(&self, table: Table, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let db = table_db(self.tables, table)?;
        let value = db.get(&self.txn, key).map_err(LmdbError::from)?;
        Ok(value.map(<[u8]>::to_vec))
    }

    fn prefix_scan(
        &self,
        table: Table,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let db = table_db(self.tables, table)?;
        Ok(scan(db, &self.txn, prefix)?)
    }
}

impl WriteTxn for LmdbWriteTxn<'_> {
    fn put(&mut self, table: Table, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        let db = table_db(self.tables, table)?;
        db.put(&mut self.txn, key, value).map_err(LmdbError::from)?;
        Ok(())
    }

    fn delete(&mut self, table: Table, key: &[u8]) -> Result<bool, StoreError> {
        let db = table_db(self.tables, table)?;
        Ok(db.delete(&mut self.txn, key).map_err(LmdbError::from)?)
    }

    fn commit(self) -> Result<(), StoreError> {
        self.txn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}

impl Environment for LmdbEnvironment {
    type Read<'a> = LmdbReadTxn<'a>;
    type Write<'a> = LmdbWriteTxn<'a>;

    fn read_txn(&self) -> Result<Self::Read<'_>, StoreError> {
        let txn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(LmdbReadTxn {
            txn,
            tables: &self.tables,
        })
    }

    fn write_txn(&self) -> Result<Self::Write<'_>, StoreError> {
        let txn = self.env.write_txn().map_err(LmdbError::from)?;
        Ok(LmdbWriteTxn {
            txn,
            tables: &self.tables,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn committed_writes_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let env = LmdbEnvironment::open(dir.path(), 10 * 1024 * 1024).unwrap();
            let mut txn = env.write_txn().unwrap();
            txn.put(Table::Headers, b"hash", b"header").unwrap();
            txn.commit().unwrap();
        }
        let env = LmdbEnvironment::open(dir.path(), 10 * 1024 * 1024).unwrap();
        let txn = env.read_txn().unwrap();
        assert_eq!(
            txn.get(Table::Headers, b"hash").unwrap(),
            Some(b"header".to_vec())
        );
    }

    #[test]
    fn sync_flushes_after_commit() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 10 * 1024 * 1024).unwrap();
        let mut txn = env.write_txn().unwrap();
        txn.put(Table::Meta, b"tip", b"1").unwrap();
        txn.commit().unwrap();
        env.sync().unwrap();
        assert!(env.read_txn().unwrap().exists(Table::Meta, b"tip").unwrap());
    }

    #[test]
    fn aborted_writes_are_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 10 * 1024 * 1024).unwrap();
        {
            let mut txn = env.write_txn().unwrap();
            txn.put(Table::Meta, b"k", b"v").unwrap();
        }
        assert!(!env.read_txn().unwrap().exists(Table::Meta, b"k").unwrap());
    }

    #[test]
    fn prefix_scan_stays_in_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 10 * 1024 * 1024).unwrap();
        let mut txn = env.write_txn().unwrap();
        txn.put(Table::HeightIndex, &[0, 1, 9], b"a").unwrap();
        txn.put(Table::HeightIndex, &[0, 1, 3], b"b").unwrap();
        txn.put(Table::HeightIndex, &[0, 2, 0], b"c").unwrap();
        let rows = txn.prefix_scan(Table::HeightIndex, &[0, 1]).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, vec![0, 1, 3]);
        assert_eq!(txn.count(Table::HeightIndex).unwrap(), 3);
        assert!(txn.delete(Table::HeightIndex, &[0, 2, 0]).unwrap());
        txn.commit().unwrap();
    }
}
