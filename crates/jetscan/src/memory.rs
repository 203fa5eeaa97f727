//! In-memory broker.
//!
//! A sparse, in-process stand-in for a JetStream broker: streams are
//! `BTreeMap`s from sequence to message, so gaps behave exactly like
//! deleted/expired messages on a real server. Used throughout the test
//! suite and available for embedding.
//!
//! The broker counts fetches, which the tests use to assert the O(log n)
//! probe bound of time-range resolution, and can be told to fail at
//! specific sequences to exercise error paths.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use jetscan_core::StreamMessage;

use crate::broker::{Broker, BrokerSession, Fetch, StreamBounds};
use crate::error::{Result, ScanError};

#[derive(Debug)]
struct StoredMessage {
    subject: String,
    timestamp_ns: i64,
    payload: Bytes,
}

#[derive(Debug, Default)]
struct Inner {
    streams: RwLock<HashMap<String, BTreeMap<u64, StoredMessage>>>,
    failing: RwLock<HashSet<(String, u64)>>,
    fetches: AtomicU64,
}

/// An in-memory [`Broker`] implementation.
#[derive(Debug, Clone, Default)]
pub struct MemoryBroker {
    inner: Arc<Inner>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message at the next sequence and return that sequence.
    pub fn publish(
        &self,
        stream: &str,
        subject: &str,
        timestamp_ns: i64,
        payload: impl Into<Bytes>,
    ) -> u64 {
        let mut streams = self.inner.streams.write().unwrap();
        let entries = streams.entry(stream.to_string()).or_default();
        let seq = entries.keys().next_back().map_or(1, |last| last + 1);
        entries.insert(
            seq,
            StoredMessage {
                subject: subject.to_string(),
                timestamp_ns,
                payload: payload.into(),
            },
        );
        seq
    }

    /// Place a message at an explicit sequence, leaving gaps addressable.
    pub fn publish_at(
        &self,
        stream: &str,
        seq: u64,
        subject: &str,
        timestamp_ns: i64,
        payload: impl Into<Bytes>,
    ) {
        let mut streams = self.inner.streams.write().unwrap();
        streams.entry(stream.to_string()).or_default().insert(
            seq,
            StoredMessage {
                subject: subject.to_string(),
                timestamp_ns,
                payload: payload.into(),
            },
        );
    }

    /// Make fetches of `seq` on `stream` fail with a transport error.
    pub fn fail_at(&self, stream: &str, seq: u64) {
        self.inner
            .failing
            .write()
            .unwrap()
            .insert((stream.to_string(), seq));
    }

    /// Total fetches served across all sessions.
    pub fn fetch_count(&self) -> u64 {
        self.inner.fetches.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Broker for MemoryBroker {
    async fn connect(&self, _url: &str, _timeout: Duration) -> Result<Box<dyn BrokerSession>> {
        Ok(Box::new(MemorySession {
            inner: Arc::clone(&self.inner),
        }))
    }
}

struct MemorySession {
    inner: Arc<Inner>,
}

#[async_trait]
impl BrokerSession for MemorySession {
    async fn stream_bounds(&mut self, stream: &str) -> Result<StreamBounds> {
        let streams = self.inner.streams.read().unwrap();
        let entries = streams.get(stream).ok_or_else(|| ScanError::StreamMetadata {
            stream: stream.to_string(),
            reason: "stream not found".to_string(),
        })?;

        match (entries.keys().next(), entries.keys().next_back()) {
            (Some(&first), Some(&last)) => Ok(StreamBounds {
                first_seq: first,
                last_seq: last,
            }),
            _ => Err(ScanError::StreamMetadata {
                stream: stream.to_string(),
                reason: "stream is empty".to_string(),
            }),
        }
    }

    async fn fetch(&mut self, stream: &str, seq: u64) -> Result<Fetch> {
        self.inner.fetches.fetch_add(1, Ordering::Relaxed);

        if self
            .inner
            .failing
            .read()
            .unwrap()
            .contains(&(stream.to_string(), seq))
        {
            return Err(ScanError::Fetch {
                seq,
                reason: "injected fetch failure".to_string(),
            });
        }

        let streams = self.inner.streams.read().unwrap();
        let entries = streams.get(stream).ok_or_else(|| ScanError::Fetch {
            seq,
            reason: format!("stream '{stream}' not found"),
        })?;

        Ok(match entries.get(&seq) {
            Some(stored) => Fetch::Found(StreamMessage {
                stream: stream.to_string(),
                subject: stored.subject.clone(),
                sequence: seq,
                timestamp_ns: stored.timestamp_ns,
                payload: stored.payload.clone(),
            }),
            None => Fetch::Absent,
        })
    }
}
