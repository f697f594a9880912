//! Consensus parameters and monetary policy.
//!
//! Parameters are fixed per network; they are not operator-configurable
//! because every peer on a network must agree on them bit for bit.

use serde::{Deserialize, Serialize};

use crate::{Amount, Height, NetworkId};

/// Base units per coin.
pub const COIN: Amount = 100_000_000;

/// Rules every node on a network must agree on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusParams {
    pub network: NetworkId,

    // ── Headers ──────────────────────────────────────────────────────────
    /// Header version produced by this software.
    pub header_version: u32,
    /// Timestamp of the genesis header.
    pub genesis_timestamp: u64,
    /// Compact target of the genesis header and of every header before the
    /// first retarget.
    pub initial_target: u32,
    /// Easiest compact target allowed by a retarget.
    pub pow_limit: u32,
    /// Desired spacing between blocks.
    pub target_block_interval_secs: u64,
    /// Number of blocks between target adjustments.
    pub retarget_window: u64,

    // ── Monetary policy ──────────────────────────────────────────────────
    /// Subsidy of the genesis block.
    pub initial_reward: Amount,
    /// Blocks between subsidy halvings.
    pub halving_interval: u64,
    /// Blocks a coinbase output stays locked.
    pub coinbase_maturity: u64,

    // ── Fees and limits ──────────────────────────────────────────────────
    /// Fee charged per net new unspent output; a rebate when negative.
    pub output_creation_fee: Amount,
    /// Minimum relay fee per started kilobyte of serialized skeleton.
    pub relay_fee_per_kb: Amount,
    /// Hard ceiling on a serialized transaction skeleton.
    pub max_tx_size: usize,
}

impl ConsensusParams {
    pub fn for_network(network: NetworkId) -> Self {
        match network {
            NetworkId::Main => Self {
                network,
                header_version: 1,
                genesis_timestamp: 1_767_225_600,
                initial_target: 0x1f00_ffff,
                pow_limit: 0x1f00_ffff,
                target_block_interval_secs: 60,
                retarget_window: 20,
                initial_reward: 50 * COIN,
                halving_interval: 1_051_200,
                coinbase_maturity: 10,
                output_creation_fee: 100_000,
                relay_fee_per_kb: 10_000,
                max_tx_size: 50_000,
            },
            NetworkId::Test => Self {
                network,
                genesis_timestamp: 1_767_225_600,
                initial_target: 0x1f7f_ffff,
                pow_limit: 0x1f7f_ffff,
                ..Self::for_network(NetworkId::Main)
            },
            NetworkId::Dev => Self {
                network,
                genesis_timestamp: 1_700_000_000,
                initial_target: 0x207f_ffff,
                pow_limit: 0x207f_ffff,
                retarget_window: 10,
                halving_interval: 150,
                coinbase_maturity: 2,
                ..Self::for_network(NetworkId::Main)
            },
        }
    }

    /// Newly minted coins allowed in the block at `height`.
    pub fn subsidy(&self, height: Height) -> Amount {
        let halvings = height / self.halving_interval.max(1);
        if halvings >= 64 {
            return 0;
        }
        self.initial_reward >> halvings
    }

    /// Lowest lock height a coinbase created at `height` may carry.
    pub fn coinbase_lock_height(&self, height: Height) -> Height {
        height.saturating_add(self.coinbase_maturity)
    }

    /// Whether `height` closes a retarget window.
    pub fn is_retarget_height(&self, height: Height) -> bool {
        height > 0 && height % self.retarget_window.max(1) == 0
    }

    /// Minimum relay fee for a skeleton of `size` serialized bytes.
    pub fn min_relay_fee(&self, size: usize) -> Amount {
        let kilobytes = (size as u64).div_ceil(1000).max(1);
        kilobytes.saturating_mul(self.relay_fee_per_kb)
    }
}

impl Default for ConsensusParams {
    fn default() -> Self {
        Self::for_network(NetworkId::Main)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subsidy_halves() {
        let p = ConsensusParams::for_network(NetworkId::Dev);
        assert_eq!(p.subsidy(0), 50 * COIN);
        assert_eq!(p.subsidy(149), 50 * COIN);
        assert_eq!(p.subsidy(150), 25 * COIN);
        assert_eq!(p.subsidy(150 * 64), 0);
    }

    #[test]
    fn relay_fee_rounds_up_per_kilobyte() {
        let p = ConsensusParams::default();
        assert_eq!(p.min_relay_fee(1), p.relay_fee_per_kb);
        assert_eq!(p.min_relay_fee(1000), p.relay_fee_per_kb);
        assert_eq!(p.min_relay_fee(1001), 2 * p.relay_fee_per_kb);
    }

    #[test]
    fn dev_inherits_main_fees() {
        let main = ConsensusParams::for_network(NetworkId::Main);
        let dev = ConsensusParams::for_network(NetworkId::Dev);
        assert_eq!(dev.output_creation_fee, main.output_creation_fee);
        assert_eq!(dev.max_tx_size, 50_000);
        assert_eq!(dev.coinbase_lock_height(5), 7);
    }
}
