//! Hooks into the parts of a node that live outside the consensus core.
//!
//! Both are fire-and-forget: the core never waits on them and never learns
//! whether they succeeded.

use glint_ledger::RollBack;
use glint_transactions::{OutputIndex, Transaction};
use glint_types::Hash256;

/// Asks the networking layer to fetch data the core is missing.
pub trait DownloadScheduler: Send + Sync {
    fn request_blocks(&self, hashes: &[Hash256]);

    fn request_outputs(&self, indexes: &[OutputIndex]);
}

/// What the wallet is told when the tip moves.
#[derive(Clone, Debug)]
pub enum WalletEvent {
    Apply {
        block: Hash256,
        height: u64,
        tx: Transaction,
    },
    Rollback {
        block: Hash256,
        height: u64,
        rollback: RollBack,
    },
}

pub trait WalletNotifier: Send + Sync {
    fn notify(&self, event: &WalletEvent);
}

/// Drops every request. For nodes without networking and for tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopScheduler;

impl DownloadScheduler for NoopScheduler {
    fn request_blocks(&self, _hashes: &[Hash256]) {}

    fn request_outputs(&self, _indexes: &[OutputIndex]) {}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNotifier;

impl WalletNotifier for NoopNotifier {
    fn notify(&self, _event: &WalletEvent) {}
}
