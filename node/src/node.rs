//! A running node: LMDB storage, the chain service and its metrics.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use glint_chain::{Blockchain, Collaborators};
use glint_store_lmdb::{check_integrity, open_shared, LmdbEnvironment, Migrator};
use glint_work::Blake2bOracle;

use crate::service::{spawn_service, MeteredNotifier, NodeHandle};
use crate::{NodeConfig, NodeError, NodeMetrics, ShutdownController, ShutdownReason};

pub struct GlintNode {
    config: NodeConfig,
    env: Arc<LmdbEnvironment>,
    metrics: Arc<NodeMetrics>,
    shutdown: ShutdownController,
    handle: NodeHandle,
    service: JoinHandle<Blockchain<LmdbEnvironment>>,
}

impl GlintNode {
    /// Open storage under `config.data_dir`, check and migrate it, open the
    /// chain and start serving requests.
    pub fn start(config: NodeConfig, collaborators: Collaborators) -> Result<Self, NodeError> {
        let env = open_shared(&config.data_dir, config.map_size)?;
        Migrator::run(&env)?;
        let report = check_integrity(&env)?;
        if !report.is_healthy() {
            return Err(NodeError::Integrity(report.errors.join("; ")));
        }
        info!(
            path = %config.data_dir.display(),
            databases = report.databases_checked,
            entries = report.total_entries,
            "storage opened"
        );

        let metrics = Arc::new(NodeMetrics::new()?);
        let collaborators = Collaborators {
            notifier: Arc::new(MeteredNotifier::new(
                collaborators.notifier,
                Arc::clone(&metrics),
            )),
            ..collaborators
        };
        let chain = Blockchain::open(
            Arc::clone(&env),
            config.params(),
            config.chain.clone(),
            Arc::new(Blake2bOracle),
            collaborators,
        )?;
        info!(
            network = %config.network,
            genesis = %chain.genesis().hash(),
            tip = %chain.current_tip()?,
            "chain opened"
        );

        let shutdown = ShutdownController::new();
        let (handle, service) = spawn_service(
            chain,
            Arc::clone(&metrics),
            config.request_queue,
            shutdown.clone(),
        );
        Ok(Self {
            config,
            env,
            metrics,
            shutdown,
            handle,
            service,
        })
    }

    pub fn handle(&self) -> NodeHandle {
        self.handle.clone()
    }

    pub fn metrics(&self) -> &NodeMetrics {
        &self.metrics
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn shutdown_controller(&self) -> &ShutdownController {
        &self.shutdown
    }

    /// Stop the chain service, wait for it to finish its current request
    /// and flush storage. Returns why the node stopped: a shutdown triggered
    /// earlier keeps its reason.
    pub async fn stop(self) -> Result<ShutdownReason, NodeError> {
        self.shutdown.trigger(ShutdownReason::Requested);
        let reason = self.shutdown.reason().unwrap_or(ShutdownReason::Requested);
        if let Err(e) = self.service.await {
            warn!(error = %e, "chain service ended abnormally");
        }
        self.env.sync()?;
        if self.config.enable_metrics {
            info!(metrics = %self.metrics.encode()?, "final metrics");
        }
        info!(path = %self.env.path().display(), %reason, "node stopped");
        Ok(reason)
    }
}
