use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("bytes do not encode a valid curve point")]
    InvalidPoint,

    #[error("bytes do not encode a canonical scalar")]
    InvalidScalar,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("range proof error: {0}")]
    RangeProof(String),
}
