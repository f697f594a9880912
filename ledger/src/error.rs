use thiserror::Error;

use glint_crypto::CryptoError;
use glint_mmr::MmrError;
use glint_store::StoreError;
use glint_transactions::TransactionError;
use glint_work::WorkError;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("accumulator error: {0}")]
    Mmr(#[from] MmrError),

    #[error("transaction error: {0}")]
    Transaction(#[from] TransactionError),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("work error: {0}")]
    Work(#[from] WorkError),

    #[error("malformed record: {0}")]
    Malformed(String),

    #[error("input {0} is not an unspent output")]
    UnknownInput(String),

    #[error("output {0} already exists")]
    DuplicateOutput(String),

    #[error("excess {0} already exists")]
    DuplicateExcess(String),

    #[error("output ledger is at {outputs} but excess ledger is at {excesses}")]
    StateMismatch { outputs: String, excesses: String },

    #[error("no rollback object for block {0}")]
    MissingRollback(String),

    #[error("header {0} not found")]
    UnknownHeader(String),
}

impl LedgerError {
    /// Whether this error means the stored state can no longer be trusted.
    pub fn is_consistency_fault(&self) -> bool {
        matches!(
            self,
            LedgerError::StateMismatch { .. }
                | LedgerError::MissingRollback(_)
                | LedgerError::Mmr(MmrError::Corrupted(_))
                | LedgerError::Mmr(MmrError::UnexpectedRemoval(_))
                | LedgerError::Mmr(MmrError::TruncatesCleared(_))
                | LedgerError::Mmr(MmrError::RemoveTooMany { .. })
                | LedgerError::Store(StoreError::Corruption(_))
        )
    }
}
