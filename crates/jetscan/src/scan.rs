//! Scan binding and execution.
//!
//! This is the surface a host (a query engine adapter, or any embedding
//! caller) drives:
//!
//! ```text
//! ScanRequest ──bind()──▶ ScanPlan ──scan(broker)──▶ Scanner
//!                            │                          │
//!                       RowSchema               next_batch() … None
//! ```
//!
//! Binding performs every validation-class check — schema loading, field
//! path resolution — strictly before any network I/O, and fixes the output
//! schema. Scanning then drives one cursor sequentially: no two network
//! operations for the same scan are ever in flight at once. Independent
//! scans share nothing and may run in parallel, each with its own broker
//! session.

use std::sync::Arc;

use jetscan_core::{ColumnType, FieldPath, Row, RowBatch, RowSchema, ScalarValue, StreamMessage};
use jetscan_schema::{decode_dynamic, decode_structured, resolve_path, MessageSchema, ResolvedPath};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::batch::BatchEmitter;
use crate::broker::Broker;
use crate::cursor::MessageCursor;
use crate::error::Result;
use crate::nats::NatsBroker;
use crate::request::{ExtractionSpec, ScanRequest};

/// The validated extraction pipeline, resolved once per scan.
#[derive(Debug)]
enum ExtractionPlan {
    None,
    Dynamic {
        fields: Vec<String>,
    },
    Structured {
        schema: MessageSchema,
        paths: Vec<ResolvedPath>,
    },
}

impl ExtractionPlan {
    fn bind(spec: &ExtractionSpec) -> Result<Self> {
        match spec {
            ExtractionSpec::None => Ok(ExtractionPlan::None),
            ExtractionSpec::Dynamic { fields } => Ok(ExtractionPlan::Dynamic {
                fields: fields.clone(),
            }),
            ExtractionSpec::Structured {
                schema_path,
                message_type,
                paths,
            } => {
                let schema = MessageSchema::load(schema_path, message_type)?;
                let paths = paths
                    .iter()
                    .map(|raw| -> Result<ResolvedPath> {
                        let path = FieldPath::parse(raw)?;
                        Ok(resolve_path(&schema, &path)?)
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(ExtractionPlan::Structured { schema, paths })
            }
        }
    }

    fn payload_type(&self) -> ColumnType {
        match self {
            // Structured payloads are typically binary; unextracted
            // payloads stay opaque too, so arbitrary bytes never fail
            // text validation.
            ExtractionPlan::None | ExtractionPlan::Structured { .. } => ColumnType::Blob,
            ExtractionPlan::Dynamic { .. } => ColumnType::Text,
        }
    }

    fn extracted_columns(&self) -> Vec<(String, ColumnType)> {
        match self {
            ExtractionPlan::None => Vec::new(),
            ExtractionPlan::Dynamic { fields } => fields
                .iter()
                .map(|field| (field.replace('.', "_"), ColumnType::Text))
                .collect(),
            ExtractionPlan::Structured { paths, .. } => paths
                .iter()
                .map(|resolved| (resolved.column_name(), resolved.column_type))
                .collect(),
        }
    }

    /// Decode one payload into the payload column plus extracted values.
    fn decode(&self, payload: &bytes::Bytes) -> (ScalarValue, Vec<ScalarValue>) {
        match self {
            ExtractionPlan::None => (ScalarValue::Blob(payload.clone()), Vec::new()),
            ExtractionPlan::Dynamic { fields } => (
                ScalarValue::Text(String::from_utf8_lossy(payload).into_owned()),
                decode_dynamic(payload, fields),
            ),
            ExtractionPlan::Structured { schema, paths } => (
                ScalarValue::Blob(payload.clone()),
                decode_structured(schema, payload, paths),
            ),
        }
    }
}

/// A bound scan: request validated, schema loaded, paths resolved, output
/// schema fixed. No I/O has happened yet.
#[derive(Debug)]
pub struct ScanPlan {
    request: ScanRequest,
    extraction: ExtractionPlan,
    schema: Arc<RowSchema>,
}

impl ScanPlan {
    /// Validate `request` and fix the output schema.
    ///
    /// All validation-class failures (parameter conflicts are caught by the
    /// request builder; schema load and field path errors here) surface
    /// before any network call, with zero rows produced.
    pub fn bind(request: ScanRequest) -> Result<Self> {
        let extraction = ExtractionPlan::bind(&request.extraction)?;
        let schema = Arc::new(RowSchema::new(
            extraction.payload_type(),
            extraction.extracted_columns(),
        ));
        debug!(
            stream = %request.stream,
            columns = schema.columns().len(),
            "bound scan request"
        );
        Ok(Self {
            request,
            extraction,
            schema,
        })
    }

    /// The fixed output schema, available before any message is fetched.
    pub fn schema(&self) -> Arc<RowSchema> {
        Arc::clone(&self.schema)
    }

    /// Start the scan against the default NATS broker.
    pub fn scan(self) -> Scanner {
        self.scan_with(Arc::new(NatsBroker::new()))
    }

    /// Start the scan against any [`Broker`] implementation.
    pub fn scan_with(self, broker: Arc<dyn Broker>) -> Scanner {
        let cancel = CancellationToken::new();
        let cursor = MessageCursor::new(
            broker,
            self.request.url.clone(),
            self.request.connect_timeout,
            self.request.stream.clone(),
            self.request.subject_filter.clone(),
            self.request.range.clone(),
            cancel.clone(),
        );
        let emitter = BatchEmitter::new(Arc::clone(&self.schema), self.request.batch_capacity);

        Scanner {
            stream: self.request.stream,
            extraction: self.extraction,
            schema: self.schema,
            cursor,
            emitter,
            cancel,
        }
    }
}

/// A running scan, polled batch by batch.
pub struct Scanner {
    stream: String,
    extraction: ExtractionPlan,
    schema: Arc<RowSchema>,
    cursor: MessageCursor,
    emitter: BatchEmitter,
    cancel: CancellationToken,
}

impl Scanner {
    /// The scan's output schema.
    pub fn schema(&self) -> Arc<RowSchema> {
        Arc::clone(&self.schema)
    }

    /// A token that cooperatively stops the scan between fetches.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Produce the next batch of rows.
    ///
    /// Returns `Ok(None)` once the scan is exhausted (idempotent). When
    /// the scan fails mid-batch, rows decoded so far are flushed first and
    /// the error is raised on the following poll.
    pub async fn next_batch(&mut self) -> Result<Option<RowBatch>> {
        loop {
            match self.cursor.next_message().await {
                Ok(Some(message)) => {
                    let row = self.assemble(message);
                    if let Some(batch) = self.emitter.push(row) {
                        debug!(stream = %self.stream, rows = batch.len(), "emitting batch");
                        return Ok(Some(batch));
                    }
                }
                Ok(None) => return Ok(self.emitter.finish()),
                Err(err) => {
                    // Flush the partial batch; the cursor re-raises the
                    // error on the next poll.
                    if let Some(batch) = self.emitter.finish() {
                        return Ok(Some(batch));
                    }
                    return Err(err);
                }
            }
        }
    }

    /// Drain the scan to completion, collecting every row.
    pub async fn collect_rows(&mut self) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(batch) = self.next_batch().await? {
            rows.extend(batch.into_rows());
        }
        Ok(rows)
    }

    fn assemble(&self, message: StreamMessage) -> Row {
        let (payload, extracted) = self.extraction.decode(&message.payload);
        Row {
            stream: message.stream,
            subject: message.subject,
            seq: message.sequence,
            timestamp_ns: message.timestamp_ns,
            payload,
            extracted,
        }
    }
}
