//! Structured schema loading.
//!
//! A structured schema is a `.proto` file compiled at request time into a
//! descriptor pool, plus the one message type the scan decodes against. The
//! parent directory of the schema file is the import root, so relative
//! imports inside the file resolve next to it.
//!
//! The loaded schema is immutable for the scan's lifetime and is shared
//! read-only between path resolution and per-message decoding.

use std::path::Path;

use prost_reflect::{DescriptorPool, MessageDescriptor};

use crate::error::{Result, SchemaError};

/// A loaded protobuf schema: the descriptor pool and the root message type.
#[derive(Debug, Clone)]
pub struct MessageSchema {
    pool: DescriptorPool,
    root: MessageDescriptor,
}

impl MessageSchema {
    /// Compile `path` and look up `message_type` in it.
    ///
    /// The type may be given as a fully-qualified name
    /// (`telemetry.Telemetry`) or, when unambiguous, as a bare name
    /// (`Telemetry`).
    ///
    /// # Errors
    ///
    /// - [`SchemaError::SchemaLoad`] if the file is missing or fails to
    ///   compile; the message carries the compiler diagnostics.
    /// - [`SchemaError::MessageTypeNotFound`] if the type is absent.
    pub fn load(path: impl AsRef<Path>, message_type: &str) -> Result<Self> {
        let path = path.as_ref();
        let display = path.display().to_string();

        let include_dir = match path.parent() {
            Some(dir) if dir != Path::new("") => dir.to_path_buf(),
            _ => Path::new(".").to_path_buf(),
        };
        let file_name = path
            .file_name()
            .ok_or_else(|| SchemaError::SchemaLoad {
                path: display.clone(),
                reason: "path has no file name".to_string(),
            })?
            .to_owned();

        let file_set =
            protox::compile([Path::new(&file_name)], [&include_dir]).map_err(|err| {
                SchemaError::SchemaLoad {
                    path: display.clone(),
                    reason: err.to_string(),
                }
            })?;

        let pool = DescriptorPool::from_file_descriptor_set(file_set).map_err(|err| {
            SchemaError::SchemaLoad {
                path: display.clone(),
                reason: err.to_string(),
            }
        })?;

        let root = Self::find_message(&pool, message_type).ok_or_else(|| {
            SchemaError::MessageTypeNotFound {
                message_type: message_type.to_string(),
                path: display,
            }
        })?;

        Ok(Self { pool, root })
    }

    /// Exact full-name lookup first, then a unique simple-name match.
    fn find_message(pool: &DescriptorPool, name: &str) -> Option<MessageDescriptor> {
        if let Some(found) = pool.get_message_by_name(name) {
            return Some(found);
        }

        let mut matches = pool.all_messages().filter(|m| m.name() == name);
        let first = matches.next()?;
        if matches.next().is_some() {
            // Ambiguous bare name; require the fully-qualified form.
            return None;
        }
        Some(first)
    }

    /// The message type payloads are decoded against.
    pub fn root(&self) -> &MessageDescriptor {
        &self.root
    }

    pub fn pool(&self) -> &DescriptorPool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{write_proto, TELEMETRY_PROTO};

    #[test]
    fn test_load_by_full_name() {
        let (_dir, path) = write_proto(TELEMETRY_PROTO);
        let schema = MessageSchema::load(&path, "telemetry.Telemetry").unwrap();
        assert_eq!(schema.root().full_name(), "telemetry.Telemetry");
    }

    #[test]
    fn test_load_by_simple_name() {
        let (_dir, path) = write_proto(TELEMETRY_PROTO);
        let schema = MessageSchema::load(&path, "Telemetry").unwrap();
        assert_eq!(schema.root().name(), "Telemetry");
    }

    #[test]
    fn test_unknown_message_type() {
        let (_dir, path) = write_proto(TELEMETRY_PROTO);
        let err = MessageSchema::load(&path, "Nope").unwrap_err();
        assert!(matches!(err, SchemaError::MessageTypeNotFound { .. }));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err =
            MessageSchema::load(dir.path().join("absent.proto"), "Telemetry").unwrap_err();
        assert!(matches!(err, SchemaError::SchemaLoad { .. }));
    }

    #[test]
    fn test_malformed_proto() {
        let (_dir, path) = write_proto("syntax = \"proto3\";\nmessage Broken {");
        let err = MessageSchema::load(&path, "Broken").unwrap_err();
        assert!(matches!(err, SchemaError::SchemaLoad { .. }));
    }
}
