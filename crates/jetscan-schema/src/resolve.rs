//! Field path resolution.
//!
//! Before any message is fetched, every requested field path is walked
//! against the loaded schema: each non-final segment must name a nested
//! message field, and the final segment's protobuf kind determines the
//! output column type. The result is cached in a [`ResolvedPath`] and
//! reused for every message in the scan, since the schema never changes
//! after load.

use jetscan_core::{ColumnType, FieldPath};
use prost_reflect::Kind;

use crate::descriptor::MessageSchema;
use crate::error::{Result, SchemaError};

/// A validated field path plus the column type it extracts to.
#[derive(Debug, Clone)]
pub struct ResolvedPath {
    pub path: FieldPath,
    pub column_type: ColumnType,
}

impl ResolvedPath {
    pub fn column_name(&self) -> String {
        self.path.column_name()
    }
}

/// Walk `path` through `schema`, validating navigability and returning the
/// terminal field's output type.
///
/// # Errors
///
/// - [`SchemaError::FieldNotFound`] if a segment is absent from the message
///   type it is looked up in.
/// - [`SchemaError::PathNotNavigable`] if a non-final segment names a field
///   that is not itself a nested message.
pub fn resolve_path(schema: &MessageSchema, path: &FieldPath) -> Result<ResolvedPath> {
    let segments = path.segments();
    let mut current = schema.root().clone();

    for (i, segment) in segments.iter().enumerate() {
        let field = current.get_field_by_name(segment).ok_or_else(|| {
            SchemaError::FieldNotFound {
                segment: segment.clone(),
                message_type: current.name().to_string(),
                path: path.as_str().to_string(),
            }
        })?;

        if i + 1 < segments.len() {
            match field.kind() {
                Kind::Message(nested) => current = nested,
                _ => {
                    return Err(SchemaError::PathNotNavigable {
                        segment: segment.clone(),
                        next: segments[i + 1].clone(),
                        path: path.as_str().to_string(),
                    })
                }
            }
        } else {
            return Ok(ResolvedPath {
                path: path.clone(),
                column_type: kind_to_column_type(&field.kind()),
            });
        }
    }

    // Unreachable: FieldPath guarantees at least one segment.
    Err(SchemaError::FieldNotFound {
        segment: String::new(),
        message_type: schema.root().name().to_string(),
        path: path.as_str().to_string(),
    })
}

/// The fixed, total mapping from protobuf field kind to output column type.
pub fn kind_to_column_type(kind: &Kind) -> ColumnType {
    match kind {
        Kind::String => ColumnType::Text,
        Kind::Bytes => ColumnType::Blob,
        Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => ColumnType::Int32,
        Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => ColumnType::Int64,
        Kind::Uint32 | Kind::Fixed32 => ColumnType::UInt32,
        Kind::Uint64 | Kind::Fixed64 => ColumnType::UInt64,
        Kind::Float => ColumnType::Float32,
        Kind::Double => ColumnType::Float64,
        Kind::Bool => ColumnType::Bool,
        // Enums surface their symbolic name.
        Kind::Enum(_) => ColumnType::Text,
        // A message as a terminal is not navigable further; it types as
        // text and always decodes to NULL.
        Kind::Message(_) => ColumnType::Text,
    }
}
