//! Persistent Merkle-summed accumulator.
//!
//! An append-only sequence of `(index, object)` leaves whose root is folded
//! pairwise up a binary tree with a pluggable [`Summator`]. Besides append it
//! supports truncation from the tail, clearing a leaf to a neutral hole,
//! discarding a leaf's object while keeping its slot, and the exact inverses
//! of both. Every operation runs inside a caller-owned storage transaction.

pub mod error;
pub mod summator;
pub mod tree;

pub use error::MmrError;
pub use summator::{HashSum, PointHashSum, PointSum, Summator};
pub use tree::{FuzzyMatch, Mmr, PruneMode, PrunedRecord};
