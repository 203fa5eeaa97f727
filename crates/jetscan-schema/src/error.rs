//! Schema Error Types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SchemaError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("failed to load schema file '{path}': {reason}")]
    SchemaLoad { path: String, reason: String },

    #[error("message type '{message_type}' not found in {path}")]
    MessageTypeNotFound { message_type: String, path: String },

    #[error("field '{segment}' not found in message type '{message_type}' (field path: {path})")]
    FieldNotFound {
        segment: String,
        message_type: String,
        path: String,
    },

    #[error(
        "field '{segment}' is not a message type, cannot navigate to '{next}' (field path: {path})"
    )]
    PathNotNavigable {
        segment: String,
        next: String,
        path: String,
    },
}
