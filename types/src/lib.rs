//! Fundamental types for the glint consensus core.
//!
//! This crate defines the small value types shared by every other crate in the
//! workspace: 32-byte hashes, timestamps, network identifiers, consensus
//! parameters and monetary policy, and the clock abstraction.

pub mod clock;
pub mod error;
pub mod hash;
pub mod network;
pub mod params;
pub mod time;

pub use clock::{Clock, SystemClock};
pub use error::TypesError;
pub use hash::Hash256;
pub use network::NetworkId;
pub use params::ConsensusParams;
pub use time::Timestamp;

/// Monetary amounts are counted in indivisible base units.
pub type Amount = u64;

/// Block height. Genesis sits at height zero.
pub type Height = u64;
