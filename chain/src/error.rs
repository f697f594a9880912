use thiserror::Error;

use glint_ledger::LedgerError;
use glint_store::StoreError;
use glint_transactions::TransactionError;
use glint_types::Hash256;
use glint_work::WorkError;

/// How a failure should be treated by whoever triggered it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed data. Fatal to the unit that carried it, never retried.
    Structural,
    /// A consensus rule was broken. Blocks and headers get marked invalid.
    ConsensusRuleViolation,
    /// Something referenced is not here yet; retry once it is downloaded.
    DataUnavailable,
    /// Local state contradicts itself. Abort loudly.
    ConsistencyFault,
}

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("transaction rejected: {0}")]
    Transaction(#[from] TransactionError),

    #[error("work error: {0}")]
    Work(#[from] WorkError),

    #[error("header {0} is already known")]
    DuplicateHeader(Hash256),

    #[error("block {0} is already known")]
    DuplicateBlock(Hash256),

    #[error("transaction {0} is already pooled")]
    DuplicateTransaction(Hash256),

    #[error("malformed header: {0}")]
    MalformedHeader(String),

    #[error("genesis {0} does not belong to this network")]
    UnknownGenesis(Hash256),

    #[error("header {0} is not known")]
    UnknownHeader(Hash256),

    #[error("no cached template matches the submitted header")]
    UnknownTemplate,

    #[error("outputs not downloaded yet: {0}")]
    NotDownloaded(String),

    #[error("rule violation: {0}")]
    Violation(String),

    #[error("block {block} does not extend tip {tip}")]
    TipMismatch { block: Hash256, tip: Hash256 },

    #[error("chain has no tip")]
    NoTip,
}

impl ChainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ChainError::Ledger(e) if e.is_consistency_fault() => ErrorKind::ConsistencyFault,
            ChainError::Ledger(LedgerError::Malformed(_)) => ErrorKind::Structural,
            ChainError::Ledger(LedgerError::Store(_)) => ErrorKind::ConsistencyFault,
            ChainError::Ledger(LedgerError::UnknownHeader(_)) => ErrorKind::DataUnavailable,
            ChainError::Ledger(_) => ErrorKind::ConsensusRuleViolation,
            ChainError::Store(_) => ErrorKind::ConsistencyFault,
            ChainError::Transaction(TransactionError::Malformed(_)) => ErrorKind::Structural,
            ChainError::Transaction(_) => ErrorKind::ConsensusRuleViolation,
            ChainError::Work(_) => ErrorKind::ConsensusRuleViolation,
            ChainError::DuplicateHeader(_)
            | ChainError::DuplicateBlock(_)
            | ChainError::DuplicateTransaction(_)
            | ChainError::MalformedHeader(_) => ErrorKind::Structural,
            ChainError::UnknownGenesis(_) | ChainError::Violation(_) => {
                ErrorKind::ConsensusRuleViolation
            }
            ChainError::UnknownHeader(_)
            | ChainError::UnknownTemplate
            | ChainError::NotDownloaded(_) => ErrorKind::DataUnavailable,
            ChainError::TipMismatch { .. } | ChainError::NoTip => ErrorKind::ConsistencyFault,
        }
    }

    /// Whether the peer that sent the offending data should be penalised.
    pub fn is_dos(&self) -> bool {
        matches!(
            self,
            ChainError::DuplicateHeader(_)
                | ChainError::DuplicateBlock(_)
                | ChainError::MalformedHeader(_)
                | ChainError::UnknownGenesis(_)
                | ChainError::Ledger(LedgerError::Malformed(_))
                | ChainError::Transaction(TransactionError::Malformed(_))
        )
    }

    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::ConsistencyFault
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_are_structural_and_penalised() {
        let err = ChainError::DuplicateHeader(Hash256::new([1; 32]));
        assert_eq!(err.kind(), ErrorKind::Structural);
        assert!(err.is_dos());
    }

    #[test]
    fn missing_rollback_is_fatal() {
        let err = ChainError::Ledger(LedgerError::MissingRollback("ab".into()));
        assert_eq!(err.kind(), ErrorKind::ConsistencyFault);
        assert!(err.is_fatal());
        assert!(!err.is_dos());
    }

    #[test]
    fn unknown_template_is_not_a_violation() {
        assert_eq!(ChainError::UnknownTemplate.kind(), ErrorKind::DataUnavailable);
    }
}
