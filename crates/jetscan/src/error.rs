//! Error types for scan operations.
//!
//! Two classes of error exist and they behave differently:
//!
//! - **Validation errors** (`ParameterConflict`, `MissingRequiredParameter`,
//!   `Schema`, `FieldPath`) are detected while binding the request, strictly
//!   before any network call, and abort with zero rows produced.
//! - **Runtime errors** (`Connection`, `StreamMetadata`, `Fetch`) abort the
//!   in-progress scan; batches already delivered are never retracted.
//!
//! Per-message decode failures are not errors at all: the affected row's
//! extracted columns become NULL and the scan continues.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScanError>;

/// Errors surfaced by scan binding and execution.
///
/// The enum is `Clone` so a failed cursor can re-raise its terminating
/// error on every subsequent poll.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScanError {
    /// Mutually exclusive request parameters were combined.
    #[error("parameter conflict: {0}")]
    ParameterConflict(String),

    /// A parameter required by another parameter is missing.
    #[error("missing required parameter: {0}")]
    MissingRequiredParameter(String),

    /// Schema loading or field path resolution failed.
    #[error(transparent)]
    Schema(#[from] jetscan_schema::SchemaError),

    /// A requested field path failed to parse.
    #[error("invalid field path: {0}")]
    FieldPath(#[from] jetscan_core::CoreError),

    /// Connecting to the broker failed or timed out.
    #[error("failed to connect to {url}: {reason}")]
    Connection { url: String, reason: String },

    /// Stream bounds could not be loaded.
    #[error("failed to load stream metadata for '{stream}': {reason}")]
    StreamMetadata { stream: String, reason: String },

    /// A fetch failed with something other than "no message at this
    /// position". Absence is control flow, never an error.
    #[error("failed to fetch message at sequence {seq}: {reason}")]
    Fetch { seq: u64, reason: String },
}
