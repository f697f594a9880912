//! Pre-built [`tracing::Span`] constructors for chain service operations.
//!
//! Consistent span names and field sets make traces easy to filter.

use tracing::{info_span, Span};

use glint_types::Hash256;

/// Span covering one request handled by the chain service.
pub fn request_span(action: &'static str) -> Span {
    info_span!("chain_request", action)
}

/// Span covering the intake of a single header.
pub fn header_span(hash: &Hash256, height: u64) -> Span {
    info_span!("header_process", hash = %hash, height)
}

/// Span covering a submitted block, including any tip movement it causes.
pub fn block_span(hash: &Hash256, height: u64) -> Span {
    info_span!("block_process", hash = %hash, height)
}

/// Span covering template assembly for a miner.
pub fn template_span() -> Span {
    info_span!("block_template")
}

/// Span covering a pass of the tip update loop.
pub fn update_span() -> Span {
    info_span!("chain_update")
}
