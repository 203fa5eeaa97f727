//! Core Error Types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("field path is empty")]
    EmptyFieldPath,

    #[error("field path '{0}' contains an empty segment")]
    EmptyPathSegment(String),
}
