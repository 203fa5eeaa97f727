//! NATS JetStream broker implementation.
//!
//! Messages are retrieved with JetStream direct gets (no consumer or
//! subscription state), and stream bounds come from the stream info the
//! server returns when the stream handle is opened. A 404 on a direct get
//! means "no message at this sequence" and maps to [`Fetch::Absent`]; every
//! other failure aborts the owning scan.

use std::collections::HashMap;
use std::time::Duration;

use async_nats::jetstream;
use async_nats::jetstream::stream::DirectGetErrorKind;
use async_trait::async_trait;
use jetscan_core::StreamMessage;
use tracing::debug;

use crate::broker::{Broker, BrokerSession, Fetch, StreamBounds};
use crate::error::{Result, ScanError};

/// Connects to NATS servers over the JetStream API.
#[derive(Debug, Clone, Default)]
pub struct NatsBroker;

impl NatsBroker {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Broker for NatsBroker {
    async fn connect(&self, url: &str, timeout: Duration) -> Result<Box<dyn BrokerSession>> {
        let client = async_nats::ConnectOptions::new()
            .connection_timeout(timeout)
            .request_timeout(Some(timeout))
            .connect(url)
            .await
            .map_err(|err| ScanError::Connection {
                url: url.to_string(),
                reason: err.to_string(),
            })?;

        debug!(url, "connected to NATS");
        Ok(Box::new(NatsSession {
            jetstream: jetstream::new(client),
            streams: HashMap::new(),
        }))
    }
}

struct NatsSession {
    jetstream: jetstream::Context,
    /// Stream handles, opened once per stream name and reused for every
    /// fetch in the scan.
    streams: HashMap<String, jetstream::stream::Stream>,
}

impl NatsSession {
    async fn stream_handle(&mut self, stream: &str) -> Result<&mut jetstream::stream::Stream> {
        if !self.streams.contains_key(stream) {
            let handle = self.jetstream.get_stream(stream).await.map_err(|err| {
                ScanError::StreamMetadata {
                    stream: stream.to_string(),
                    reason: err.to_string(),
                }
            })?;
            self.streams.insert(stream.to_string(), handle);
        }
        // Present by construction.
        self.streams
            .get_mut(stream)
            .ok_or_else(|| ScanError::StreamMetadata {
                stream: stream.to_string(),
                reason: "stream handle missing after open".to_string(),
            })
    }
}

#[async_trait]
impl BrokerSession for NatsSession {
    async fn stream_bounds(&mut self, stream: &str) -> Result<StreamBounds> {
        let handle = self.stream_handle(stream).await?;
        let state = &handle.cached_info().state;
        Ok(StreamBounds {
            first_seq: state.first_sequence,
            last_seq: state.last_sequence,
        })
    }

    async fn fetch(&mut self, stream: &str, seq: u64) -> Result<Fetch> {
        let name = stream.to_string();
        let handle = self.stream_handle(stream).await?;

        match handle.direct_get(seq).await {
            Ok(message) => Ok(Fetch::Found(StreamMessage {
                stream: name,
                subject: message.subject.to_string(),
                sequence: message.sequence,
                timestamp_ns: message.time.unix_timestamp_nanos() as i64,
                payload: message.payload,
            })),
            Err(err) if err.kind() == DirectGetErrorKind::NotFound => Ok(Fetch::Absent),
            Err(err) => Err(ScanError::Fetch {
                seq,
                reason: err.to_string(),
            }),
        }
    }
}
