use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to persist ticket file: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
