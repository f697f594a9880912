//! Persistent chain data: headers, blocks, and the output and excess
//! ledgers whose accumulator roots every header commits to.
//!
//! All operations run inside a caller-owned storage transaction; a failed
//! mutation leaves that transaction dirty and the caller aborts it.

pub mod block;
pub mod block_store;
pub mod burdens;
pub mod cache;
pub mod codec;
pub mod error;
pub mod excesses;
pub mod header;
pub mod header_store;
pub mod ledger;
pub mod outputs;
pub mod pool;
pub mod rollback;

pub use block::{Block, ContextBlock};
pub use block_store::BlockStore;
pub use burdens::BurdenStore;
pub use cache::ExpiringCache;
pub use error::LedgerError;
pub use excesses::ExcessesLedger;
pub use header::{hash_level, next_popow, ContextHeader, Header, HeaderTemplate, MerkleRoots};
pub use header_store::HeaderStore;
pub use ledger::{Ledger, Materialized};
pub use outputs::{OutputMatch, OutputsLedger, SpentOutput};
pub use pool::ProvisionalPool;
pub use rollback::{RollBack, RollbackStore};
