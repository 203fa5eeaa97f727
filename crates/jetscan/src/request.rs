//! Scan requests and validation.
//!
//! A [`ScanRequest`] captures everything a scan needs: the stream, the
//! broker URL (an explicit field with a documented default, never ambient
//! state), an optional subject filter, a range, and an extraction spec.
//! Requests are immutable once built and live for the scan's duration.
//!
//! The builder performs the purely-request-level checks: mutually
//! exclusive range kinds, mutually exclusive extraction kinds, and the
//! schema parameters required by structured extraction. Schema loading and
//! path resolution happen later, in [`crate::scan::ScanPlan::bind`], still
//! before any network I/O.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::{Result, ScanError};

/// Default broker address when none is given.
pub const DEFAULT_URL: &str = "nats://localhost:4222";

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default rows per emitted batch.
pub const DEFAULT_BATCH_CAPACITY: usize = 2048;

/// The requested scan range.
///
/// After resolution a range is always a closed sequence interval; time
/// bounds are converted by binary search against the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Range {
    /// The whole stream.
    Unbounded,
    /// Closed sequence interval; unset bounds default to the stream's
    /// first/last sequence.
    BySequence {
        start: Option<u64>,
        end: Option<u64>,
    },
    /// Closed time interval in nanoseconds since the Unix epoch; unset
    /// bounds resolve to the stream's first/last sequence.
    ByTime {
        start_ns: Option<i64>,
        end_ns: Option<i64>,
    },
}

/// How to decode message payloads into extracted columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionSpec {
    /// No extraction; the payload column is an opaque blob.
    None,
    /// JSON key lookup; every extracted column is text.
    Dynamic { fields: Vec<String> },
    /// Protobuf decoding under a schema loaded from `schema_path`.
    Structured {
        schema_path: PathBuf,
        message_type: String,
        paths: Vec<String>,
    },
}

/// An immutable, validated scan request.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub stream: String,
    pub url: String,
    pub subject_filter: Option<String>,
    pub range: Range,
    pub extraction: ExtractionSpec,
    pub connect_timeout: Duration,
    pub batch_capacity: usize,
}

impl ScanRequest {
    pub fn builder(stream: impl Into<String>) -> ScanRequestBuilder {
        ScanRequestBuilder::new(stream)
    }
}

/// Builder for [`ScanRequest`].
///
/// ## Example
///
/// ```ignore
/// let request = ScanRequest::builder("telemetry")
///     .url("nats://localhost:4222")
///     .subject("dc1")
///     .start_time(start)
///     .proto_schema("schemas/telemetry.proto", "Telemetry")
///     .extract_proto(["location.zone", "reading"])
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct ScanRequestBuilder {
    stream: String,
    url: String,
    subject_filter: Option<String>,
    start_seq: Option<u64>,
    end_seq: Option<u64>,
    start_time_ns: Option<i64>,
    end_time_ns: Option<i64>,
    json_fields: Vec<String>,
    schema_path: Option<PathBuf>,
    message_type: Option<String>,
    proto_paths: Vec<String>,
    connect_timeout: Duration,
    batch_capacity: usize,
}

impl ScanRequestBuilder {
    pub fn new(stream: impl Into<String>) -> Self {
        Self {
            stream: stream.into(),
            url: DEFAULT_URL.to_string(),
            subject_filter: None,
            start_seq: None,
            end_seq: None,
            start_time_ns: None,
            end_time_ns: None,
            json_fields: Vec::new(),
            schema_path: None,
            message_type: None,
            proto_paths: Vec::new(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            batch_capacity: DEFAULT_BATCH_CAPACITY,
        }
    }

    /// Broker URL (default `nats://localhost:4222`).
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Substring filter applied to each message's subject.
    pub fn subject(mut self, filter: impl Into<String>) -> Self {
        self.subject_filter = Some(filter.into());
        self
    }

    /// Inclusive start sequence. Mutually exclusive with time bounds.
    pub fn start_seq(mut self, seq: u64) -> Self {
        self.start_seq = Some(seq);
        self
    }

    /// Inclusive end sequence. Mutually exclusive with time bounds.
    pub fn end_seq(mut self, seq: u64) -> Self {
        self.end_seq = Some(seq);
        self
    }

    /// Inclusive start instant. Mutually exclusive with sequence bounds.
    pub fn start_time(mut self, at: DateTime<Utc>) -> Self {
        self.start_time_ns = Some(instant_to_ns(at));
        self
    }

    /// Inclusive end instant. Mutually exclusive with sequence bounds.
    pub fn end_time(mut self, at: DateTime<Utc>) -> Self {
        self.end_time_ns = Some(instant_to_ns(at));
        self
    }

    /// JSON fields to extract by top-level key lookup.
    pub fn extract_json<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.json_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Protobuf schema file and message type for structured extraction.
    pub fn proto_schema(mut self, path: impl Into<PathBuf>, message_type: impl Into<String>) -> Self {
        self.schema_path = Some(path.into());
        self.message_type = Some(message_type.into());
        self
    }

    /// Dotted protobuf field paths to extract.
    pub fn extract_proto<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.proto_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn batch_capacity(mut self, capacity: usize) -> Self {
        self.batch_capacity = capacity.max(1);
        self
    }

    /// Validate the request-level invariants and build the request.
    ///
    /// # Errors
    ///
    /// - [`ScanError::ParameterConflict`] if sequence and time bounds are
    ///   mixed, or both dynamic and structured extraction are requested.
    /// - [`ScanError::MissingRequiredParameter`] if the stream is empty, or
    ///   structured extraction lacks its schema file or message type.
    pub fn build(self) -> Result<ScanRequest> {
        if self.stream.is_empty() {
            return Err(ScanError::MissingRequiredParameter(
                "stream name must be non-empty".to_string(),
            ));
        }

        let has_seq = self.start_seq.is_some() || self.end_seq.is_some();
        let has_time = self.start_time_ns.is_some() || self.end_time_ns.is_some();
        if has_seq && has_time {
            return Err(ScanError::ParameterConflict(
                "cannot mix sequence-based (start_seq/end_seq) and time-based \
                 (start_time/end_time) bounds"
                    .to_string(),
            ));
        }

        if !self.json_fields.is_empty() && !self.proto_paths.is_empty() {
            return Err(ScanError::ParameterConflict(
                "cannot use both dynamic (json) and structured (proto) extraction".to_string(),
            ));
        }

        let range = if has_seq {
            Range::BySequence {
                start: self.start_seq,
                end: self.end_seq,
            }
        } else if has_time {
            Range::ByTime {
                start_ns: self.start_time_ns,
                end_ns: self.end_time_ns,
            }
        } else {
            Range::Unbounded
        };

        let extraction = if !self.proto_paths.is_empty() {
            let schema_path = self.schema_path.ok_or_else(|| {
                ScanError::MissingRequiredParameter(
                    "a schema file is required for structured extraction".to_string(),
                )
            })?;
            let message_type = self.message_type.ok_or_else(|| {
                ScanError::MissingRequiredParameter(
                    "a message type is required for structured extraction".to_string(),
                )
            })?;
            ExtractionSpec::Structured {
                schema_path,
                message_type,
                paths: self.proto_paths,
            }
        } else if !self.json_fields.is_empty() {
            ExtractionSpec::Dynamic {
                fields: self.json_fields,
            }
        } else {
            ExtractionSpec::None
        };

        Ok(ScanRequest {
            stream: self.stream,
            url: self.url,
            subject_filter: self.subject_filter,
            range,
            extraction,
            connect_timeout: self.connect_timeout,
            batch_capacity: self.batch_capacity,
        })
    }
}

/// Convert an instant to nanoseconds since the epoch, clamping instants
/// outside the representable range (~year 2262).
fn instant_to_ns(at: DateTime<Utc>) -> i64 {
    at.timestamp_nanos_opt().unwrap_or(i64::MAX)
}
