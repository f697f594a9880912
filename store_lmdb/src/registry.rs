//! One environment per canonical path.
//!
//! Every component that touches the same data directory must observe the
//! same state, so a second open of a live path returns the existing handle.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, Weak};

use crate::{LmdbEnvironment, LmdbError};

type Registry = Mutex<HashMap<PathBuf, Weak<LmdbEnvironment>>>;

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Open the environment at `path`, or return the instance already open there.
pub fn open_shared(path: &Path, map_size: usize) -> Result<Arc<LmdbEnvironment>, LmdbError> {
    std::fs::create_dir_all(path)?;
    let canonical = path.canonicalize()?;

    let mut entries = registry()
        .lock()
        .map_err(|_| LmdbError::Schema("environment registry poisoned".to_string()))?;
    entries.retain(|_, weak| weak.strong_count() > 0);

    if let Some(existing) = entries.get(&canonical).and_then(Weak::upgrade) {
        tracing::debug!(path = %canonical.display(), "reusing open LMDB environment");
        return Ok(existing);
    }

    let env = Arc::new(LmdbEnvironment::open(&canonical, map_size)?);
    entries.insert(canonical, Arc::downgrade(&env));
    Ok(env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_store::{Environment, ReadTxn, Table, WriteTxn};

    #[test]
    fn same_path_yields_same_instance() {
        let dir = tempfile::tempdir().unwrap();
        let a = open_shared(dir.path(), 10 * 1024 * 1024).unwrap();
        let b = open_shared(&dir.path().join("."), 10 * 1024 * 1024).unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let mut txn = a.write_txn().unwrap();
        txn.put(Table::Meta, b"k", b"v").unwrap();
        txn.commit().unwrap();
        assert!(b.read_txn().unwrap().exists(Table::Meta, b"k").unwrap());
    }

    #[test]
    fn dropped_instance_can_be_reopened() {
        let dir = tempfile::tempdir().unwrap();
        let first = open_shared(dir.path(), 10 * 1024 * 1024).unwrap();
        drop(first);
        assert!(open_shared(dir.path(), 10 * 1024 * 1024).is_ok());
    }
}
