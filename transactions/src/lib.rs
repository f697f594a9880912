//! Confidential outputs, excesses and transactions.
//!
//! An output hides its value in a Pedersen commitment that is further blinded
//! by the owner's address key (the APC). A transaction spends outputs, creates
//! outputs and carries additional excesses; it balances when the APC sums on
//! both sides agree once address keys, excess keys, minted coins and fees are
//! accounted for. Blocks carry only the [`TransactionSkeleton`]: indexes and
//! excesses, never payloads.

pub mod builder;
pub mod codec;
pub mod error;
pub mod excess;
pub mod output;
pub mod transaction;
pub mod validation;

pub use builder::{
    coinbase_from_opening, coinbase_transaction, OutputRequest, SpendableOutput, TransactionBuilder,
};
pub use error::TransactionError;
pub use excess::{Excess, ExcessIndex};
pub use output::{Output, OutputIndex, OutputKind, OutputTerms, RangeProof, OUTPUT_VERSION};
pub use transaction::{Transaction, TransactionSkeleton};
pub use validation::{non_context_verify, VerifyMode};
