//! Stream Message
//!
//! A `StreamMessage` is one message fetched from a stream by direct
//! positional access. Sequence numbers are assigned monotonically by the
//! log and may have gaps; timestamps are monotonically non-decreasing with
//! sequence. Messages are read-only and are not retained past the row they
//! produce.

use bytes::Bytes;

/// A single message read from a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamMessage {
    /// Name of the stream the message belongs to.
    pub stream: String,

    /// Subject the message was published on.
    pub subject: String,

    /// Sequence number within the stream.
    pub sequence: u64,

    /// Nanoseconds since the Unix epoch.
    pub timestamp_ns: i64,

    /// Raw payload bytes.
    pub payload: Bytes,
}

impl StreamMessage {
    pub fn new(
        stream: impl Into<String>,
        subject: impl Into<String>,
        sequence: u64,
        timestamp_ns: i64,
        payload: Bytes,
    ) -> Self {
        Self {
            stream: stream.into(),
            subject: subject.into(),
            sequence,
            timestamp_ns,
            payload,
        }
    }
}
