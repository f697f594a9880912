//! LMDB storage backend for the glint consensus core.
//!
//! Implements the `glint-store` contract with the `heed` LMDB bindings: one
//! environment per data directory, one named database per table.

pub mod environment;
pub mod error;
pub mod integrity;
pub mod migration;
pub mod registry;

pub use environment::{LmdbEnvironment, LmdbReadTxn, LmdbWriteTxn};
pub use error::LmdbError;
pub use integrity::{check_data_dir, check_integrity, IntegrityReport};
pub use migration::{Migrator, CURRENT_SCHEMA_VERSION};
pub use registry::open_shared;
