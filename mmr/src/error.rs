use thiserror::Error;

use glint_crypto::CryptoError;
use glint_store::StoreError;

#[derive(Debug, Error)]
pub enum MmrError {
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("invalid leaf value: {0}")]
    Crypto(#[from] CryptoError),

    #[error("index {0} already present")]
    DuplicateIndex(String),

    #[error("index {0} not found")]
    NotFound(String),

    #[error("{operation} is not allowed on tree {tree}")]
    WrongPruneMode {
        operation: &'static str,
        tree: &'static str,
    },

    #[error("cannot remove {requested} leaves from a tree of {count}")]
    RemoveTooMany { requested: u64, count: u64 },

    #[error("removed leaf {0} was not in the expected set")]
    UnexpectedRemoval(String),

    #[error("slot {0} is cleared; revert the clearing before truncating it")]
    TruncatesCleared(u64),

    #[error("accumulator corrupted: {0}")]
    Corrupted(String),
}
