//! JetScan - bounded, typed scans over NATS JetStream streams
//!
//! JetScan exposes an append-only, sequence-numbered stream as a bounded
//! sequence of typed rows. A caller names a stream and a range — an
//! inclusive sequence interval or an inclusive time interval — plus an
//! optional extraction schema, and receives rows in fixed-size batches:
//! five metadata/payload columns followed by the extracted fields.
//!
//! Messages are fetched one at a time by direct positional address; no
//! consumer or subscription state exists anywhere. Time ranges resolve to
//! sequence ranges by binary search over the same positional fetch.
//!
//! # Example
//!
//! ```ignore
//! use jetscan::{ScanPlan, ScanRequest};
//!
//! let request = ScanRequest::builder("telemetry")
//!     .subject("dc1")
//!     .proto_schema("schemas/telemetry.proto", "Telemetry")
//!     .extract_proto(["location.zone", "reading"])
//!     .build()?;
//!
//! let plan = ScanPlan::bind(request)?;          // validates, no I/O
//! println!("columns: {:?}", plan.schema().columns());
//!
//! let mut scanner = plan.scan();                // lazy; connects on first poll
//! while let Some(batch) = scanner.next_batch().await? {
//!     for row in batch.rows() {
//!         println!("{} {:?}", row.seq, row.extracted);
//!     }
//! }
//! ```

mod batch;
pub mod broker;
mod cursor;
pub mod error;
pub mod memory;
pub mod nats;
mod range;
pub mod request;
pub mod scan;

pub use broker::{Broker, BrokerSession, Fetch, StreamBounds};
pub use error::{Result, ScanError};
pub use memory::MemoryBroker;
pub use nats::NatsBroker;
pub use request::{
    ExtractionSpec, Range, ScanRequest, ScanRequestBuilder, DEFAULT_BATCH_CAPACITY,
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_URL,
};
pub use scan::{ScanPlan, Scanner};

pub use jetscan_core::{
    Column, ColumnType, FieldPath, Row, RowBatch, RowSchema, ScalarValue, StreamMessage,
};
pub use jetscan_schema::SchemaError;
