//! Output rows and row schema.
//!
//! Every scan produces rows with a fixed column layout: five metadata and
//! payload columns first (`stream`, `subject`, `seq`, `timestamp`,
//! `payload`), then one column per requested extracted field, in request
//! order. The schema is known before the first message is fetched.

use std::sync::Arc;

use crate::value::{ColumnType, ScalarValue};

/// A named, typed output column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

/// The fixed output schema of a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSchema {
    columns: Vec<Column>,
}

/// Number of metadata/payload columns preceding extracted columns.
pub const METADATA_COLUMNS: usize = 5;

impl RowSchema {
    /// Build the schema for a scan.
    ///
    /// `payload_type` is [`ColumnType::Blob`] except in dynamic (JSON)
    /// extraction mode, where the payload is emitted as text. Extracted
    /// columns follow in declared order.
    pub fn new(payload_type: ColumnType, extracted: Vec<(String, ColumnType)>) -> Self {
        let mut columns = vec![
            Column {
                name: "stream".to_string(),
                column_type: ColumnType::Text,
            },
            Column {
                name: "subject".to_string(),
                column_type: ColumnType::Text,
            },
            Column {
                name: "seq".to_string(),
                column_type: ColumnType::UInt64,
            },
            Column {
                name: "timestamp".to_string(),
                column_type: ColumnType::Timestamp,
            },
            Column {
                name: "payload".to_string(),
                column_type: payload_type,
            },
        ];
        columns.extend(extracted.into_iter().map(|(name, column_type)| Column {
            name,
            column_type,
        }));
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Number of extracted (non-metadata) columns.
    pub fn extracted_len(&self) -> usize {
        self.columns.len() - METADATA_COLUMNS
    }
}

/// A single output row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub stream: String,
    pub subject: String,
    pub seq: u64,
    pub timestamp_ns: i64,
    /// Raw payload, as a blob or (dynamic mode only) text.
    pub payload: ScalarValue,
    /// Extracted column values, in declared order.
    pub extracted: Vec<ScalarValue>,
}

/// An ordered batch of rows sharing one schema.
///
/// Batch boundaries carry no meaning; rows are always in increasing
/// sequence order within a scan.
#[derive(Debug, Clone)]
pub struct RowBatch {
    schema: Arc<RowSchema>,
    rows: Vec<Row>,
}

impl RowBatch {
    pub fn new(schema: Arc<RowSchema>, rows: Vec<Row>) -> Self {
        Self { schema, rows }
    }

    pub fn schema(&self) -> &RowSchema {
        &self.schema
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_column_order() {
        let schema = RowSchema::new(
            ColumnType::Blob,
            vec![
                ("location_zone".to_string(), ColumnType::Text),
                ("reading".to_string(), ColumnType::Float64),
            ],
        );

        let names: Vec<&str> = schema.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["stream", "subject", "seq", "timestamp", "payload", "location_zone", "reading"]
        );
        assert_eq!(schema.extracted_len(), 2);
    }

    #[test]
    fn test_payload_type_follows_mode() {
        let blob = RowSchema::new(ColumnType::Blob, vec![]);
        assert_eq!(blob.columns()[4].column_type, ColumnType::Blob);

        let text = RowSchema::new(ColumnType::Text, vec![]);
        assert_eq!(text.columns()[4].column_type, ColumnType::Text);
    }
}
