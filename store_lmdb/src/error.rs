use thiserror::Error;

#[derive(Debug, Error)]
pub enum LmdbError {
    #[error("LMDB error: {0}")]
    Heed(#[from] heed::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("table {0} was not opened")]
    MissingTable(&'static str),

    #[error("schema error: {0}")]
    Schema(String),
}

impl From<LmdbError> for glint_store::StoreError {
    fn from(e: LmdbError) -> Self {
        glint_store::StoreError::Backend(e.to_string())
    }
}
