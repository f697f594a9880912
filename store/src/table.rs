//! The fixed set of tables every backend provides.

/// A named, ordered key-value table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    /// Accumulator nodes, keyed by tree id, level and position.
    MmrNodes,
    /// Accumulator leaf objects, keyed by tree id and sequence number.
    MmrLeaves,
    /// Accumulator index to sequence number, keyed by tree id and index.
    MmrIndexes,
    /// Accumulator sequence number to index, keyed by tree id and sequence number.
    MmrOrders,
    /// Per-tree counters and state ids.
    MmrMeta,
    /// Objects pruned from an accumulator, kept for serving sync requests.
    MmrArchive,
    /// Header hash to context header.
    Headers,
    /// Height and hash, for "all headers at height" queries.
    HeightIndex,
    /// Missing parent hash and child hash, for out-of-order headers.
    LooseEnds,
    /// Header hash to context block.
    Blocks,
    /// Header hash to the rollback object of that block.
    Rollbacks,
    /// Burden hash records of confirmed outputs.
    Burdens,
    /// Schema version and chain bookkeeping.
    Meta,
}

impl Table {
    pub const ALL: [Table; 13] = [
        Table::MmrNodes,
        Table::MmrLeaves,
        Table::MmrIndexes,
        Table::MmrOrders,
        Table::MmrMeta,
        Table::MmrArchive,
        Table::Headers,
        Table::HeightIndex,
        Table::LooseEnds,
        Table::Blocks,
        Table::Rollbacks,
        Table::Burdens,
        Table::Meta,
    ];

    /// Database name used by on-disk backends.
    pub fn name(&self) -> &'static str {
        match self {
            Table::MmrNodes => "mmr_nodes",
            Table::MmrLeaves => "mmr_leaves",
            Table::MmrIndexes => "mmr_indexes",
            Table::MmrOrders => "mmr_orders",
            Table::MmrMeta => "mmr_meta",
            Table::MmrArchive => "mmr_archive",
            Table::Headers => "headers",
            Table::HeightIndex => "height_index",
            Table::LooseEnds => "loose_ends",
            Table::Blocks => "blocks",
            Table::Rollbacks => "rollbacks",
            Table::Burdens => "burdens",
            Table::Meta => "meta",
        }
    }
}
