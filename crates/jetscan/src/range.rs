//! Range resolution.
//!
//! Every scan range normalizes to a closed sequence interval before
//! fetching begins. Sequence and unbounded ranges resolve without I/O by
//! filling unset bounds from the stream's first/last sequence. Time ranges
//! resolve each bound independently with a binary search over the
//! positional fetch primitive:
//!
//! - the **start** bound becomes the minimal sequence whose instant is at
//!   or after the target; if none exists the scan is empty.
//! - the **end** bound becomes the last sequence whose instant is at or
//!   before the target, computed as (first sequence strictly after the
//!   target) minus one; if nothing lies after the target the whole stream
//!   qualifies and the end is the stream's last sequence.
//!
//! Probes that land on a gap advance the search's lower bound past the gap;
//! absence is never an error. Any other fetch failure aborts resolution.
//! Ties on timestamp resolve to the lowest matching sequence, so repeated
//! queries are deterministic.

use tracing::debug;

use crate::broker::{BrokerSession, Fetch, StreamBounds};
use crate::error::Result;
use crate::request::Range;

/// Resolve `range` to an inclusive sequence interval.
///
/// Returns `None` when the range provably matches nothing (a start instant
/// newer than the newest message); the caller must yield zero rows without
/// error.
pub(crate) async fn resolve_range(
    session: &mut dyn BrokerSession,
    stream: &str,
    bounds: StreamBounds,
    range: &Range,
) -> Result<Option<(u64, u64)>> {
    let resolved = match range {
        Range::Unbounded => Some((bounds.first_seq, bounds.last_seq)),
        Range::BySequence { start, end } => Some((
            start.unwrap_or(bounds.first_seq),
            end.unwrap_or(bounds.last_seq),
        )),
        Range::ByTime { start_ns, end_ns } => {
            let start_seq = match start_ns {
                Some(target) => {
                    match first_seq_at_or_after(session, stream, bounds, *target).await? {
                        Some(seq) => seq,
                        // Target is newer than the newest message.
                        None => return Ok(None),
                    }
                }
                None => bounds.first_seq,
            };

            let end_seq = match end_ns {
                Some(target) => {
                    // Last instant <= target is one position before the
                    // first instant strictly after it. The predecessor may
                    // be a gap; the fetch loop skips gaps anyway.
                    match first_seq_at_or_after(session, stream, bounds, target.saturating_add(1))
                        .await?
                    {
                        Some(seq) => seq.saturating_sub(1),
                        None => bounds.last_seq,
                    }
                }
                None => bounds.last_seq,
            };

            Some((start_seq, end_seq))
        }
    };

    if let Some((start, end)) = resolved {
        debug!(stream, start, end, "resolved scan range");
    }
    Ok(resolved)
}

/// Binary search for the minimal sequence whose instant is `>= target_ns`.
///
/// O(log n) fetches for a stream with n addressable positions. A probe
/// that finds no message advances the lower bound past the probed
/// position.
async fn first_seq_at_or_after(
    session: &mut dyn BrokerSession,
    stream: &str,
    bounds: StreamBounds,
    target_ns: i64,
) -> Result<Option<u64>> {
    let mut left = bounds.first_seq;
    let mut right = bounds.last_seq;
    let mut candidate = None;

    while left <= right {
        let mid = left + (right - left) / 2;

        // Probe the midpoint, skipping forward past gap positions until a
        // message exists or the interval's upper bound is passed.
        let mut probe = mid;
        let found = loop {
            if probe > right {
                break None;
            }
            match session.fetch(stream, probe).await? {
                Fetch::Found(message) => break Some(message),
                Fetch::Absent => probe += 1,
            }
        };

        match found {
            Some(message) if message.timestamp_ns >= target_ns => {
                candidate = Some(message.sequence);
                // Positions below the original midpoint are unexplored
                // and may hold an earlier match.
                match mid.checked_sub(1) {
                    Some(new_right) => right = new_right,
                    None => break,
                }
            }
            Some(message) => {
                // Timestamps are non-decreasing, so nothing at or below
                // this message qualifies.
                left = message.sequence + 1;
            }
            None => {
                // [mid, right] is all gaps; any match lies below.
                match mid.checked_sub(1) {
                    Some(new_right) => right = new_right,
                    None => break,
                }
            }
        }
    }

    Ok(candidate)
}
