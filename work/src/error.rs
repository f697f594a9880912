use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkError {
    #[error("compact target {0:#010x} is negative, zero or overflows 256 bits")]
    InvalidCompactTarget(u32),

    #[error("proof of work hash is not below target")]
    InsufficientWork,

    #[error("nonce search cancelled")]
    Cancelled,

    #[error("nonce space exhausted")]
    Exhausted,
}
