//! JetScan Schema - payload shapes and decoding
//!
//! This crate turns opaque message payloads into typed column values. Two
//! incompatible payload encodings are supported behind one contract:
//!
//! - **Dynamic** (JSON): keyed lookup against a self-describing document,
//!   no upfront shape, every value coerced to text.
//! - **Structured** (protobuf): a `.proto` schema loaded at request time,
//!   dotted field paths validated against it, and values extracted with
//!   their protobuf types mapped to output column types.
//!
//! Schema loading and path resolution happen once, during request
//! validation, strictly before any network I/O. Per-message decode failures
//! are recovered as NULL columns and never abort a scan.

pub mod decode;
pub mod descriptor;
pub mod error;
pub mod resolve;

#[cfg(test)]
pub(crate) mod testutil;

pub use decode::{decode_dynamic, decode_structured};
pub use descriptor::MessageSchema;
pub use error::{Result, SchemaError};
pub use resolve::{resolve_path, ResolvedPath};
