//! Nonce search (multi-threaded CPU).

use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use crate::target::compact_to_target;
use crate::validator::{hash_meets_target, PowOracle};
use crate::WorkError;

/// Nonces tried per parallel round before checking the cancellation flag.
const BATCH_SIZE: u64 = 1 << 16;

/// Searches the nonce space for a header template.
///
/// Each round splits a batch across the rayon pool and keeps the lowest
/// matching nonce, so the result is the smallest valid nonce regardless of
/// thread scheduling.
#[derive(Clone, Debug)]
pub struct NonceSearch {
    batch_size: u64,
}

impl Default for NonceSearch {
    fn default() -> Self {
        Self {
            batch_size: BATCH_SIZE,
        }
    }
}

impl NonceSearch {
    pub fn with_batch_size(batch_size: u64) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    pub fn search(
        &self,
        oracle: &(impl PowOracle + ?Sized),
        template: &[u8],
        height: u64,
        bits: u32,
        cancel: &AtomicBool,
    ) -> Result<u64, WorkError> {
        let target = compact_to_target(bits)?;
        let mut start = 0u64;
        loop {
            if cancel.load(Ordering::Relaxed) {
                return Err(WorkError::Cancelled);
            }
            let end = start.saturating_add(self.batch_size);
            let found = (start..end).into_par_iter().find_first(|nonce| {
                hash_meets_target(&oracle.pow_hash(template, *nonce, height), &target)
            });
            if let Some(nonce) = found {
                return Ok(nonce);
            }
            if end == u64::MAX {
                return Err(WorkError::Exhausted);
            }
            start = end;
        }
    }
}
