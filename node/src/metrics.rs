//! Prometheus metrics for the glint node.
//!
//! [`NodeMetrics`] owns a dedicated [`Registry`]; [`NodeMetrics::encode`]
//! renders it in the Prometheus text exposition format.

use prometheus::{
    register_histogram_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Encoder, Histogram, HistogramOpts, IntCounter, IntGauge,
    Opts, Registry, TextEncoder,
};

/// Central collection of all node-level Prometheus metrics.
pub struct NodeMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Headers that were new to the header chain.
    pub headers_accepted: IntCounter,
    /// Blocks applied on top of the tip.
    pub blocks_applied: IntCounter,
    /// Blocks undone during reorganisations.
    pub blocks_rolled_back: IntCounter,
    /// Blocks found to break a consensus rule.
    pub blocks_invalid: IntCounter,
    pub transactions_accepted: IntCounter,
    pub transactions_rejected: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// Height of the current tip.
    pub tip_height: IntGauge,
    /// Pending transactions in the mempool.
    pub mempool_size: IntGauge,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Time spent handling one submitted block, in milliseconds.
    pub block_process_time_ms: Histogram,
}

impl NodeMetrics {
    /// Create a fresh set of metrics, all registered under a new [`Registry`].
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let headers_accepted = register_int_counter_with_registry!(
            Opts::new("glint_headers_accepted_total", "Headers added to the header chain"),
            registry
        )?;
        let blocks_applied = register_int_counter_with_registry!(
            Opts::new("glint_blocks_applied_total", "Blocks applied to the ledger"),
            registry
        )?;
        let blocks_rolled_back = register_int_counter_with_registry!(
            Opts::new(
                "glint_blocks_rolled_back_total",
                "Blocks undone during reorganisations"
            ),
            registry
        )?;
        let blocks_invalid = register_int_counter_with_registry!(
            Opts::new("glint_blocks_invalid_total", "Blocks rejected as invalid"),
            registry
        )?;
        let transactions_accepted = register_int_counter_with_registry!(
            Opts::new(
                "glint_transactions_accepted_total",
                "Transactions accepted into the mempool"
            ),
            registry
        )?;
        let transactions_rejected = register_int_counter_with_registry!(
            Opts::new(
                "glint_transactions_rejected_total",
                "Transactions refused by the mempool"
            ),
            registry
        )?;

        let tip_height = register_int_gauge_with_registry!(
            Opts::new("glint_tip_height", "Height of the current tip"),
            registry
        )?;
        let mempool_size = register_int_gauge_with_registry!(
            Opts::new("glint_mempool_size", "Pending transactions"),
            registry
        )?;

        // Exponential buckets covering 0.1 ms to about 1.6 s.
        let block_process_time_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "glint_block_process_time_ms",
                "Block handling time in milliseconds"
            )
            .buckets(prometheus::exponential_buckets(0.1, 2.0, 15)?),
            registry
        )?;

        Ok(Self {
            registry,
            headers_accepted,
            blocks_applied,
            blocks_rolled_back,
            blocks_invalid,
            transactions_accepted,
            transactions_rejected,
            tip_height,
            mempool_size,
            block_process_time_ms,
        })
    }

    /// Render every metric in the text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_output_names_every_family() {
        let metrics = NodeMetrics::new().unwrap();
        metrics.blocks_applied.inc();
        metrics.tip_height.set(7);
        let text = metrics.encode().unwrap();
        assert!(text.contains("glint_blocks_applied_total 1"));
        assert!(text.contains("glint_tip_height 7"));
        assert!(text.contains("glint_block_process_time_ms"));
    }

    #[test]
    fn registries_are_independent() {
        let a = NodeMetrics::new().unwrap();
        let b = NodeMetrics::new().unwrap();
        a.headers_accepted.inc();
        assert_eq!(b.headers_accepted.get(), 0);
    }
}
