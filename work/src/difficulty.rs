//! Cumulative work and target retargeting.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Add;

use primitive_types::{U256, U512};
use serde::{Deserialize, Serialize};

use glint_types::ConsensusParams;

use crate::target::{compact_to_target, target_to_compact};
use crate::WorkError;

/// Expected number of hashes represented by one or more headers.
///
/// Stored big-endian so that byte order and numeric order agree.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Work([u8; 32]);

impl Work {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn from_u256(value: U256) -> Self {
        let mut bytes = [0u8; 32];
        value.to_big_endian(&mut bytes);
        Self(bytes)
    }

    pub fn to_u256(&self) -> U256 {
        U256::from_big_endian(&self.0)
    }

    /// Work of a single header with the given compact target: `2^256 / (target + 1)`.
    pub fn from_compact(bits: u32) -> Result<Self, WorkError> {
        let target = compact_to_target(bits)?;
        Ok(Self::from_u256((!target / (target + U256::one())) + U256::one()))
    }
}

impl Add for Work {
    type Output = Work;

    fn add(self, rhs: Work) -> Work {
        Work::from_u256(self.to_u256().saturating_add(rhs.to_u256()))
    }
}

impl PartialOrd for Work {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Work {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl fmt::Debug for Work {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Work({})", self.to_u256())
    }
}

/// Recomputes targets at the end of every retarget window.
#[derive(Clone, Debug)]
pub struct DifficultyAdjuster {
    target_interval_secs: u64,
    window: u64,
    pow_limit: u32,
}

/// A retarget never moves the target by more than this factor.
const MAX_ADJUSTMENT_FACTOR: u64 = 4;

impl DifficultyAdjuster {
    pub fn new(params: &ConsensusParams) -> Self {
        Self {
            target_interval_secs: params.target_block_interval_secs,
            window: params.retarget_window.max(2),
            pow_limit: params.pow_limit,
        }
    }

    pub fn window(&self) -> u64 {
        self.window
    }

    /// Timespan the headers `[height - window, height - 1]` should take.
    pub fn expected_timespan(&self) -> u64 {
        (self.window - 1) * self.target_interval_secs
    }

    /// New compact target after a window whose first and last headers are
    /// `actual_timespan` seconds apart.
    pub fn retarget(&self, previous_bits: u32, actual_timespan: u64) -> Result<u32, WorkError> {
        let expected = self.expected_timespan().max(1);
        let clamped = actual_timespan.clamp(
            expected / MAX_ADJUSTMENT_FACTOR,
            expected * MAX_ADJUSTMENT_FACTOR,
        );

        let previous = compact_to_target(previous_bits)?;
        let limit = compact_to_target(self.pow_limit)?;

        let scaled: U512 = previous.full_mul(U256::from(clamped)) / U512::from(expected);
        let next = U256::try_from(scaled).unwrap_or(limit).min(limit);
        if next.is_zero() {
            return Ok(target_to_compact(U256::one()));
        }
        Ok(target_to_compact(next))
    }
}
