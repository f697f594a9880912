//! Bookkeeping of outstanding download requests.
//!
//! A hash or index is passed to the scheduler the first time it is found
//! missing, again after a short pause, and after that at most hourly.
//! Items nobody asked for during two retry periods are forgotten.

use glint_ledger::ExpiringCache;
use glint_transactions::OutputIndex;
use glint_types::{Hash256, Timestamp};

/// Pause before the first retry.
pub const FIRST_RETRY_SECS: u64 = 10;
/// Pause between later retries.
pub const LATER_RETRY_SECS: u64 = 3_600;
/// Attempts untouched for this long are dropped.
pub const FORGET_AFTER_SECS: u64 = 2 * LATER_RETRY_SECS;
/// Most items tracked at once; the longest untouched go first.
pub const MAX_TRACKED: usize = 100_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Wanted {
    Block(Hash256),
    Output(OutputIndex),
}

#[derive(Clone, Copy, Debug)]
struct Attempt {
    last: Timestamp,
    count: u32,
}

#[derive(Debug)]
pub struct DownloadTracker {
    attempts: ExpiringCache<Wanted, Attempt>,
}

impl Default for DownloadTracker {
    fn default() -> Self {
        Self::with_limits(FORGET_AFTER_SECS, MAX_TRACKED)
    }
}

impl DownloadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(forget_after_secs: u64, capacity: usize) -> Self {
        Self {
            attempts: ExpiringCache::new(forget_after_secs, capacity),
        }
    }

    /// Filter `wanted` down to what should be requested at `now`, recording
    /// the attempt for each item let through.
    pub fn due(&mut self, wanted: impl IntoIterator<Item = Wanted>, now: Timestamp) -> Vec<Wanted> {
        self.attempts.purge_expired(now);
        let mut due = Vec::new();
        for item in wanted {
            let count = match self.attempts.get(&item, now) {
                None => 0,
                Some(attempt) => {
                    let pause = if attempt.count <= 1 {
                        FIRST_RETRY_SECS
                    } else {
                        LATER_RETRY_SECS
                    };
                    if !attempt.last.has_expired(pause, now) {
                        continue;
                    }
                    attempt.count
                }
            };
            let attempt = Attempt {
                last: now,
                count: count + 1,
            };
            self.attempts.insert(item, attempt, now);
            due.push(item);
        }
        due
    }

    /// Stop tracking something that has arrived.
    pub fn arrived(&mut self, item: &Wanted) {
        self.attempts.remove(item);
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }
}
