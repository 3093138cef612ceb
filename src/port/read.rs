//! Bounded-retry read.
//!
//! A single low-level read returns as soon as one idle gap elapses, which is
//! usually before the caller's buffer is full. `read_bounded` keeps asking
//! for the missing bytes but stops after `ReadPolicy::idle_retry_ceiling`
//! empty results, so one call never waits longer than
//! `ReadPolicy::max_read_duration` on a silent line.

use super::timeout::ReadPolicy;
use std::io;
use tracing::trace;

/// Outcome of one bounded read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadSummary {
    /// Bytes placed at the front of the caller's buffer.
    pub bytes_read: usize,
    /// Low-level reads that returned nothing.
    pub idle_retries: u32,
    /// Low-level reads issued in total.
    pub reads_issued: u32,
}

impl ReadSummary {
    /// True when fewer than `requested` bytes arrived.
    pub fn is_short(&self, requested: usize) -> bool {
        self.bytes_read < requested
    }
}

/// Fill `buffer` using `read_chunk`, stopping when it is full, when the idle
/// ceiling is reached, or on the first OS error.
///
/// The idle counter is never reset within a call: a slow trickle of data
/// cannot stretch the call past the documented bound.
pub fn read_bounded<F>(buffer: &mut [u8], policy: &ReadPolicy, mut read_chunk: F) -> io::Result<ReadSummary>
where
    F: FnMut(&mut [u8]) -> io::Result<usize>,
{
    let mut summary = ReadSummary::default();

    while summary.bytes_read < buffer.len() {
        let n = read_chunk(&mut buffer[summary.bytes_read..])?;
        summary.reads_issued += 1;

        if n == 0 {
            summary.idle_retries += 1;
            trace!(idle_retries = summary.idle_retries, "idle read");
            if summary.idle_retries >= policy.idle_retry_ceiling() {
                break;
            }
            continue;
        }

        summary.bytes_read += n;
    }

    Ok(summary)
}
