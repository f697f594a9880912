//! Why and when the node stops.
//!
//! One [`ShutdownController`] is shared by the daemon, the node and the chain
//! service. The first trigger wins and its [`ShutdownReason`] is kept, so the
//! daemon can tell an operator stop from a storage fault and exit
//! accordingly.

use std::fmt;
use std::sync::Arc;

use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShutdownReason {
    /// SIGINT or SIGTERM.
    Signal(&'static str),
    /// [`crate::GlintNode::stop`] or an embedding application.
    Requested,
    /// The chain service hit an error that leaves storage untrustworthy.
    ConsistencyFault(String),
}

impl ShutdownReason {
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::ConsistencyFault(_))
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signal(name) => write!(f, "received {name}"),
            Self::Requested => f.write_str("stop requested"),
            Self::ConsistencyFault(detail) => write!(f, "consistency fault: {detail}"),
        }
    }
}

/// Cloneable trigger side; every clone fires the same shutdown.
#[derive(Clone)]
pub struct ShutdownController {
    tx: Arc<watch::Sender<Option<ShutdownReason>>>,
}

/// Waiting side handed to tasks.
pub struct ShutdownListener {
    rx: watch::Receiver<Option<ShutdownReason>>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// A listener that also sees a shutdown triggered before it subscribed.
    pub fn subscribe(&self) -> ShutdownListener {
        ShutdownListener {
            rx: self.tx.subscribe(),
        }
    }

    /// Start shutting down. Returns false if a shutdown was already under
    /// way; the earlier reason is kept.
    pub fn trigger(&self, reason: ShutdownReason) -> bool {
        let first = self.tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason.clone());
            true
        });
        if first {
            info!(%reason, "shutdown triggered");
        }
        first
    }

    pub fn reason(&self) -> Option<ShutdownReason> {
        self.tx.borrow().clone()
    }

    /// Wait until SIGINT, SIGTERM or an internal trigger and return the reason
    /// that won.
    pub async fn wait(&self) -> ShutdownReason {
        let mut listener = self.subscribe();
        let ctrl_c = signal::ctrl_c();

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(e) => {
                    warn!(error = %e, "no SIGTERM handler, waiting for SIGINT only");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => { self.trigger(ShutdownReason::Signal("SIGINT")); }
            _ = terminate => { self.trigger(ShutdownReason::Signal("SIGTERM")); }
            reason = listener.triggered() => return reason,
        }
        self.reason().unwrap_or(ShutdownReason::Requested)
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownListener {
    /// Resolves once shutdown is triggered. A dropped controller counts as a
    /// plain stop request.
    pub async fn triggered(&mut self) -> ShutdownReason {
        loop {
            let current = self.rx.borrow_and_update().clone();
            if let Some(reason) = current {
                return reason;
            }
            if self.rx.changed().await.is_err() {
                return ShutdownReason::Requested;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_listener_sees_the_first_reason() {
        let controller = ShutdownController::new();
        let mut early = controller.subscribe();
        assert!(controller.trigger(ShutdownReason::ConsistencyFault("tip".into())));
        assert!(!controller.trigger(ShutdownReason::Requested));

        let mut late = controller.clone().subscribe();
        let expected = ShutdownReason::ConsistencyFault("tip".into());
        assert_eq!(early.triggered().await, expected);
        assert_eq!(late.triggered().await, expected);
        assert_eq!(controller.reason(), Some(expected));
    }

    #[tokio::test]
    async fn wait_returns_an_internal_trigger() {
        let controller = ShutdownController::new();
        let trigger = controller.clone();
        tokio::spawn(async move {
            trigger.trigger(ShutdownReason::Requested);
        });
        assert_eq!(controller.wait().await, ShutdownReason::Requested);
    }

    #[test]
    fn only_faults_are_faults() {
        assert!(ShutdownReason::ConsistencyFault(String::new()).is_fault());
        assert!(!ShutdownReason::Signal("SIGTERM").is_fault());
        assert_eq!(ShutdownReason::Requested.to_string(), "stop requested");
    }
}
