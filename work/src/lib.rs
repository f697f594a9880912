//! Header proof-of-work.
//!
//! The hash function itself sits behind [`PowOracle`] so that it can be
//! versioned per height; the rest of this crate deals with targets: compact
//! encoding, cumulative work for fork choice, retargeting, and a parallel
//! nonce search used by template mining and genesis construction.

pub mod difficulty;
pub mod error;
pub mod generator;
pub mod target;
pub mod validator;

pub use difficulty::{DifficultyAdjuster, Work};
pub use error::WorkError;
pub use generator::NonceSearch;
pub use target::{compact_to_target, target_to_compact};
pub use validator::{hash_meets_target, validate_pow, Blake2bOracle, PowOracle};

pub use primitive_types::U256;
