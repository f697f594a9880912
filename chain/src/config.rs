use glint_ledger::pool::{DEFAULT_POOL_CAPACITY, DEFAULT_POOL_TTL_SECS};
use serde::{Deserialize, Serialize};

/// Tunables of the chain manager. None of these are consensus rules.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Most block steps one candidate path may contain.
    pub max_path_steps: usize,
    /// How far below the tip alternative forks are still considered.
    pub fork_horizon: u64,
    /// Guard on the number of paths one `update` call may follow.
    pub max_update_iterations: usize,
    /// Accept headers without checking their proof of work.
    pub skip_pow_check: bool,
    pub verification_cache_ttl_secs: u64,
    pub verification_cache_capacity: usize,
    pub template_ttl_secs: u64,
    pub template_cache_capacity: usize,
    /// Pending transactions kept before new ones are refused.
    pub mempool_capacity: usize,
    /// Unconfirmed outputs kept before the oldest are dropped.
    pub provisional_capacity: usize,
    pub provisional_ttl_secs: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            max_path_steps: 256,
            fork_horizon: 128,
            max_update_iterations: 1_024,
            skip_pow_check: false,
            verification_cache_ttl_secs: 600,
            verification_cache_capacity: 10_000,
            template_ttl_secs: 600,
            template_cache_capacity: 64,
            mempool_capacity: 5_000,
            provisional_capacity: DEFAULT_POOL_CAPACITY,
            provisional_ttl_secs: DEFAULT_POOL_TTL_SECS,
        }
    }
}
