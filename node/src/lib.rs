//! glint node: hosts the consensus core behind a typed request service.
//!
//! The node owns the storage environment and one [`glint_chain::Blockchain`]
//! on a single writer task. Everything else (networking, wallets, miners)
//! talks to it through a [`NodeHandle`].

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod node;
pub mod service;
pub mod shutdown;
pub mod tracing_spans;

pub use config::NodeConfig;
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use metrics::NodeMetrics;
pub use node::GlintNode;
pub use service::{spawn_service, MeteredNotifier, NodeHandle, Request, Response};
pub use shutdown::{ShutdownController, ShutdownListener, ShutdownReason};
