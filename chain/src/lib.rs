//! The chain manager: header tree, block application with rollback, the
//! mempool and block templates for miners.

pub mod blockchain;
pub mod collaborators;
pub mod config;
pub mod download;
pub mod error;
pub mod genesis;
pub mod header_chain;
pub mod mempool;
pub mod template;
pub mod validation;

pub use blockchain::{
    BlockOutcome, Blockchain, Collaborators, SubmitOutcome, TxOutcome, UpdateSummary,
};
pub use collaborators::{
    DownloadScheduler, NoopNotifier, NoopScheduler, WalletEvent, WalletNotifier,
};
pub use config::ChainConfig;
pub use download::{DownloadTracker, Wanted};
pub use error::{ChainError, ErrorKind};
pub use genesis::{build_genesis, genesis_coin, genesis_transaction};
pub use header_chain::{Action, HeaderChain, HeaderOutcome};
pub use mempool::{fate, Fate, Mempool};
pub use template::{template_key, BlockTemplate, TemplateCache};
pub use validation::{block_violation, input_violation, novelty_violation, VerificationCache};
