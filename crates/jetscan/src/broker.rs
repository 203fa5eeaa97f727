//! Broker abstraction.
//!
//! A scan talks to its log through two narrow traits: [`Broker`] opens a
//! session, [`BrokerSession`] answers stream-bounds lookups and direct
//! positional fetches. Fetching a position with no message is a normal
//! outcome ([`Fetch::Absent`]), never an error; sequence numbers can have
//! gaps and binary search probes them freely.
//!
//! Each scan owns its session exclusively and drops it when the scan
//! reaches a terminal state. Implementations: [`crate::nats::NatsBroker`]
//! for a real JetStream broker and [`crate::memory::MemoryBroker`] for
//! in-process use.

use std::time::Duration;

use async_trait::async_trait;
use jetscan_core::StreamMessage;

use crate::error::Result;

/// First and last sequence numbers currently addressable in a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamBounds {
    pub first_seq: u64,
    pub last_seq: u64,
}

/// Three-way fetch outcome: a message, or nothing at that position.
///
/// Transport failures are reported through `Result`, not through this
/// enum.
#[derive(Debug, Clone)]
pub enum Fetch {
    Found(StreamMessage),
    Absent,
}

/// Connects sessions to a broker.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Establish a session, failing after `timeout`.
    async fn connect(&self, url: &str, timeout: Duration) -> Result<Box<dyn BrokerSession>>;
}

/// An exclusively-owned connection to a broker.
#[async_trait]
pub trait BrokerSession: Send {
    /// Look up the stream's first/last sequence.
    async fn stream_bounds(&mut self, stream: &str) -> Result<StreamBounds>;

    /// Fetch the message at `seq`, if one exists there.
    async fn fetch(&mut self, stream: &str, seq: u64) -> Result<Fetch>;
}
