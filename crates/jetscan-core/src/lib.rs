//! JetScan Core - shared leaf types
//!
//! This crate defines the fundamental data types used across JetScan:
//!
//! - [`StreamMessage`]: a single message read from a JetStream stream
//! - [`Row`] / [`RowBatch`]: the typed output handed to callers
//! - [`ScalarValue`] / [`ColumnType`]: the closed set of column values/types
//! - [`FieldPath`]: a dotted reference into a structured payload
//!
//! It carries no I/O and no decoding logic; those live in `jetscan-schema`
//! and `jetscan`.

pub mod error;
pub mod field_path;
pub mod message;
pub mod row;
pub mod value;

pub use error::{CoreError, Result};
pub use field_path::FieldPath;
pub use message::StreamMessage;
pub use row::{Column, Row, RowBatch, RowSchema};
pub use value::{ColumnType, ScalarValue};
