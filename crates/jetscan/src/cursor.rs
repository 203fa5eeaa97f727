//! The scan's state machine.
//!
//! ```text
//! Idle → Connecting → RangeResolving → Streaming ⇄ (per-fetch)
//!                                          ↓
//!                                 Exhausted | Failed
//! ```
//!
//! The cursor owns the broker session for exactly one scan. Nothing
//! happens until the first poll: connecting, loading stream bounds, and
//! resolving the range all run lazily, so a bound request performs zero
//! I/O until driven. While streaming, the current sequence advances by one
//! after every resolved position — found, absent, or filtered out alike —
//! and the session is dropped on every terminal transition.
//!
//! `Exhausted` is idempotent (polling again keeps returning "no more
//! messages"); `Failed` re-raises its terminating error on every
//! subsequent poll.

use std::sync::Arc;
use std::time::Duration;

use jetscan_core::StreamMessage;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::broker::{Broker, BrokerSession, Fetch};
use crate::error::{Result, ScanError};
use crate::range::resolve_range;
use crate::request::Range;

enum State {
    Idle,
    Streaming { current: u64, end: u64 },
    Exhausted,
    Failed(ScanError),
}

pub(crate) struct MessageCursor {
    broker: Arc<dyn Broker>,
    url: String,
    connect_timeout: Duration,
    stream: String,
    subject_filter: Option<String>,
    range: Range,
    session: Option<Box<dyn BrokerSession>>,
    state: State,
    cancel: CancellationToken,
}

impl MessageCursor {
    pub(crate) fn new(
        broker: Arc<dyn Broker>,
        url: String,
        connect_timeout: Duration,
        stream: String,
        subject_filter: Option<String>,
        range: Range,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            broker,
            url,
            connect_timeout,
            stream,
            subject_filter,
            range,
            session: None,
            state: State::Idle,
            cancel,
        }
    }

    /// Advance to the next message inside the resolved interval that
    /// passes the subject filter.
    ///
    /// `Ok(None)` means the scan is exhausted (or was cancelled). An error
    /// moves the cursor to `Failed`; later calls re-raise it.
    pub(crate) async fn next_message(&mut self) -> Result<Option<StreamMessage>> {
        loop {
            match &self.state {
                State::Failed(err) => return Err(err.clone()),
                State::Exhausted => return Ok(None),
                State::Idle => match self.open().await {
                    Ok(state) => self.state = state,
                    Err(err) => {
                        self.fail(err.clone());
                        return Err(err);
                    }
                },
                State::Streaming { current, end } => {
                    let (seq, end) = (*current, *end);

                    if seq > end {
                        debug!(stream = %self.stream, last = end, "scan exhausted");
                        self.finish();
                        return Ok(None);
                    }
                    if self.cancel.is_cancelled() {
                        debug!(stream = %self.stream, at = seq, "scan cancelled");
                        self.finish();
                        return Ok(None);
                    }

                    let session = match self.session.as_mut() {
                        Some(session) => session,
                        None => {
                            let err = ScanError::Fetch {
                                seq,
                                reason: "broker session closed".to_string(),
                            };
                            self.fail(err.clone());
                            return Err(err);
                        }
                    };

                    match session.fetch(&self.stream, seq).await {
                        Ok(Fetch::Found(message)) => {
                            self.state = State::Streaming {
                                current: seq + 1,
                                end,
                            };
                            if let Some(filter) = &self.subject_filter {
                                if !message.subject.contains(filter.as_str()) {
                                    trace!(seq, subject = %message.subject, "subject filtered");
                                    continue;
                                }
                            }
                            return Ok(Some(message));
                        }
                        Ok(Fetch::Absent) => {
                            trace!(seq, "no message at sequence");
                            self.state = State::Streaming {
                                current: seq + 1,
                                end,
                            };
                        }
                        Err(err) => {
                            self.fail(err.clone());
                            return Err(err);
                        }
                    }
                }
            }
        }
    }

    /// Connect, load stream bounds, and resolve the range.
    async fn open(&mut self) -> Result<State> {
        let mut session = self.broker.connect(&self.url, self.connect_timeout).await?;
        let bounds = session.stream_bounds(&self.stream).await?;
        debug!(
            stream = %self.stream,
            first = bounds.first_seq,
            last = bounds.last_seq,
            "loaded stream bounds"
        );

        match resolve_range(session.as_mut(), &self.stream, bounds, &self.range).await? {
            Some((start, end)) => {
                self.session = Some(session);
                Ok(State::Streaming {
                    current: start,
                    end,
                })
            }
            None => {
                debug!(stream = %self.stream, "range matches no messages");
                Ok(State::Exhausted)
            }
        }
    }

    fn finish(&mut self) {
        self.session = None;
        self.state = State::Exhausted;
    }

    fn fail(&mut self, err: ScanError) {
        self.session = None;
        self.state = State::Failed(err);
    }
}
