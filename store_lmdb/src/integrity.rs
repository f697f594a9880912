//! LMDB database integrity checks.
//!
//! Run on startup to detect corruption early, before the node begins
//! processing headers and blocks.

use std::path::Path;

use heed::types::Bytes;

use glint_store::Table;

use crate::{LmdbEnvironment, LmdbError};

/// Summary of an integrity check run.
#[derive(Debug, Default)]
pub struct IntegrityReport {
    pub databases_checked: u32,
    pub total_entries: u64,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Open each table's database and count its entries.
///
/// Read failures are recorded in the report rather than returned.
pub fn check_integrity(env: &LmdbEnvironment) -> Result<IntegrityReport, LmdbError> {
    let mut report = IntegrityReport::default();
    let rtxn = env.env().read_txn()?;

    for table in Table::ALL {
        match env
            .env()
            .open_database::<Bytes, Bytes>(&rtxn, Some(table.name()))
        {
            Ok(Some(db)) => {
                report.databases_checked += 1;
                match db.len(&rtxn) {
                    Ok(count) => report.total_entries += count,
                    Err(e) => report
                        .errors
                        .push(format!("failed to read database '{}': {}", table.name(), e)),
                }
            }
            Ok(None) => report
                .errors
                .push(format!("database '{}' is missing", table.name())),
            Err(e) => report
                .errors
                .push(format!("failed to open database '{}': {}", table.name(), e)),
        }
    }

    Ok(report)
}

/// Returns an error if the directory exists but holds no `data.mdb`.
pub fn check_data_dir(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Ok(());
    }
    let data_file = path.join("data.mdb");
    if !data_file.exists() {
        return Err(format!(
            "LMDB directory exists but data.mdb is missing at {}",
            path.display()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_environment_is_healthy() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 10 * 1024 * 1024).unwrap();
        let report = check_integrity(&env).unwrap();
        assert!(report.is_healthy(), "{:?}", report.errors);
        assert_eq!(report.databases_checked as usize, Table::ALL.len());
        assert_eq!(report.total_entries, 0);
    }

    #[test]
    fn missing_data_file_is_flagged() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_data_dir(dir.path()).is_err());
        assert!(check_data_dir(&dir.path().join("absent")).is_ok());
    }
}
