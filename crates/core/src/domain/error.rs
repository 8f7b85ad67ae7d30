// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    #[error("Index name must not be empty")]
    EmptyIndexName,

    #[error("Invalid index name '{0}': {1}")]
    InvalidIndexName(String, &'static str),
}

pub type Result<T> = std::result::Result<T, DomainError>;
