use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("chain error: {0}")]
    Chain(#[from] glint_chain::ChainError),

    #[error("store error: {0}")]
    Store(#[from] glint_store::StoreError),

    #[error("LMDB error: {0}")]
    Lmdb(#[from] glint_store_lmdb::LmdbError),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("storage failed its integrity check: {0}")]
    Integrity(String),

    #[error("logging error: {0}")]
    Logging(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("chain service has stopped")]
    ServiceClosed,

    #[error("unexpected response to {0}")]
    UnexpectedResponse(&'static str),
}
