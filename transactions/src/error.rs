use thiserror::Error;

use glint_crypto::CryptoError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("malformed encoding: {0}")]
    Malformed(String),

    #[error("{0} are not sorted or contain duplicates")]
    NotSorted(&'static str),

    #[error("duplicate output {0}")]
    DuplicateOutput(String),

    #[error("duplicate excess {0}")]
    DuplicateExcess(String),

    #[error("invalid range proof on output {0}")]
    InvalidRangeProof(String),

    #[error("invalid address signature on output {0}")]
    InvalidAddressSignature(String),

    #[error("invalid excess signature")]
    InvalidExcessSignature,

    #[error("additional excess does not claim an unclaimed output of the transaction")]
    UnclaimedExcess,

    #[error("more than one coinbase output")]
    MultipleCoinbase,

    #[error("coinbase output not allowed here")]
    UnexpectedCoinbase,

    #[error("coinbase value must be transparent")]
    OpaqueCoinbase,

    #[error("coinbase lock height {lock_height} below required {required}")]
    CoinbaseNotLocked { lock_height: u64, required: u64 },

    #[error("transaction does not balance")]
    Unbalanced,

    #[error("skeleton of {size} bytes exceeds {max}")]
    TooLarge { size: usize, max: usize },

    #[error("input {0} carries a burden no excess satisfies")]
    UnsatisfiedBurden(String),

    #[error("transactions conflict: {0}")]
    MergeConflict(String),

    #[error("fee arithmetic overflow")]
    FeeOverflow,

    #[error("cannot build transaction: {0}")]
    Build(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
}
