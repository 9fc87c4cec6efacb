use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid since expression: {0}")]
    InvalidSince(String),
    #[error("invalid repository: {0}")]
    InvalidRepository(String),
}
