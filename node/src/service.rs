//! The chain service: a single writer task that owns the [`Blockchain`].
//!
//! Callers hold a cloneable [`NodeHandle`] and send typed [`Request`]s over
//! an `mpsc` channel; each request carries a `oneshot` for its reply.
//! Requests are handled strictly one at a time, so the chain never sees
//! concurrent mutation.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use glint_chain::{
    BlockOutcome, BlockTemplate, Blockchain, HeaderOutcome, SubmitOutcome, TxOutcome,
    UpdateSummary, WalletEvent, WalletNotifier,
};
use glint_crypto::SecretKey;
use glint_ledger::{Block, ContextHeader, Header, OutputMatch};
use glint_store::Environment;
use glint_transactions::{Output, TransactionSkeleton};
use glint_types::Hash256;

use crate::shutdown::{ShutdownController, ShutdownReason};
use crate::tracing_spans;
use crate::{NodeError, NodeMetrics};

/// Everything the chain service can be asked to do.
#[derive(Debug)]
pub enum Request {
    AddHeader(Header),
    AddBlock(Block),
    AddOutputs(Vec<Output>),
    AddTransaction(TransactionSkeleton),
    GiveBlockTemplate(SecretKey),
    SubmitSolution(Header),
    Update,
    GetTip,
    GetHeader(Hash256),
    GetHeadersAtHeight(u64),
    GetBlock(Hash256),
    FindOutputs(Vec<u8>),
    GetMempool,
}

impl Request {
    fn action(&self) -> &'static str {
        match self {
            Self::AddHeader(_) => "add_header",
            Self::AddBlock(_) => "add_block",
            Self::AddOutputs(_) => "add_outputs",
            Self::AddTransaction(_) => "add_transaction",
            Self::GiveBlockTemplate(_) => "give_block_template",
            Self::SubmitSolution(_) => "submit_solution",
            Self::Update => "update",
            Self::GetTip => "get_tip",
            Self::GetHeader(_) => "get_header",
            Self::GetHeadersAtHeight(_) => "get_headers_at_height",
            Self::GetBlock(_) => "get_block",
            Self::FindOutputs(_) => "find_outputs",
            Self::GetMempool => "get_mempool",
        }
    }
}

#[derive(Clone, Debug)]
pub enum Response {
    HeaderAdded(HeaderOutcome),
    BlockAdded(BlockOutcome),
    OutputsAdded(usize),
    TransactionAdded(TxOutcome),
    Template(Box<BlockTemplate>),
    Solution(SubmitOutcome),
    Updated(UpdateSummary),
    Tip { hash: Hash256, height: Option<u64> },
    Header(Option<Box<ContextHeader>>),
    Headers(Vec<Header>),
    Block(Option<Box<Block>>),
    Outputs(Vec<OutputMatch>),
    Mempool { pending: usize, included: Vec<Hash256> },
}

type Envelope = (Request, oneshot::Sender<Result<Response, NodeError>>);

/// Cloneable sender side of the chain service.
#[derive(Clone)]
pub struct NodeHandle {
    tx: mpsc::Sender<Envelope>,
}

impl NodeHandle {
    /// Send a request and wait for its reply.
    pub async fn request(&self, request: Request) -> Result<Response, NodeError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send((request, reply))
            .await
            .map_err(|_| NodeError::ServiceClosed)?;
        rx.await.map_err(|_| NodeError::ServiceClosed)?
    }

    pub async fn add_header(&self, header: Header) -> Result<HeaderOutcome, NodeError> {
        match self.request(Request::AddHeader(header)).await? {
            Response::HeaderAdded(outcome) => Ok(outcome),
            _ => Err(NodeError::UnexpectedResponse("add_header")),
        }
    }

    pub async fn add_block(&self, block: Block) -> Result<BlockOutcome, NodeError> {
        match self.request(Request::AddBlock(block)).await? {
            Response::BlockAdded(outcome) => Ok(outcome),
            _ => Err(NodeError::UnexpectedResponse("add_block")),
        }
    }

    pub async fn add_outputs(&self, outputs: Vec<Output>) -> Result<usize, NodeError> {
        match self.request(Request::AddOutputs(outputs)).await? {
            Response::OutputsAdded(count) => Ok(count),
            _ => Err(NodeError::UnexpectedResponse("add_outputs")),
        }
    }

    pub async fn add_transaction(
        &self,
        skeleton: TransactionSkeleton,
    ) -> Result<TxOutcome, NodeError> {
        match self.request(Request::AddTransaction(skeleton)).await? {
            Response::TransactionAdded(outcome) => Ok(outcome),
            _ => Err(NodeError::UnexpectedResponse("add_transaction")),
        }
    }

    pub async fn block_template(&self, address: SecretKey) -> Result<BlockTemplate, NodeError> {
        match self.request(Request::GiveBlockTemplate(address)).await? {
            Response::Template(template) => Ok(*template),
            _ => Err(NodeError::UnexpectedResponse("give_block_template")),
        }
    }

    pub async fn submit_solution(&self, solved: Header) -> Result<SubmitOutcome, NodeError> {
        match self.request(Request::SubmitSolution(solved)).await? {
            Response::Solution(outcome) => Ok(outcome),
            _ => Err(NodeError::UnexpectedResponse("submit_solution")),
        }
    }

    pub async fn update(&self) -> Result<UpdateSummary, NodeError> {
        match self.request(Request::Update).await? {
            Response::Updated(summary) => Ok(summary),
            _ => Err(NodeError::UnexpectedResponse("update")),
        }
    }

    /// Hash and height of the current tip.
    pub async fn tip(&self) -> Result<(Hash256, Option<u64>), NodeError> {
        match self.request(Request::GetTip).await? {
            Response::Tip { hash, height } => Ok((hash, height)),
            _ => Err(NodeError::UnexpectedResponse("get_tip")),
        }
    }

    pub async fn header(&self, hash: Hash256) -> Result<Option<ContextHeader>, NodeError> {
        match self.request(Request::GetHeader(hash)).await? {
            Response::Header(header) => Ok(header.map(|h| *h)),
            _ => Err(NodeError::UnexpectedResponse("get_header")),
        }
    }

    pub async fn headers_at_height(&self, height: u64) -> Result<Vec<Header>, NodeError> {
        match self.request(Request::GetHeadersAtHeight(height)).await? {
            Response::Headers(headers) => Ok(headers),
            _ => Err(NodeError::UnexpectedResponse("get_headers_at_height")),
        }
    }

    pub async fn block(&self, hash: Hash256) -> Result<Option<Block>, NodeError> {
        match self.request(Request::GetBlock(hash)).await? {
            Response::Block(block) => Ok(block.map(|b| *b)),
            _ => Err(NodeError::UnexpectedResponse("get_block")),
        }
    }

    pub async fn find_outputs(&self, prefix: Vec<u8>) -> Result<Vec<OutputMatch>, NodeError> {
        match self.request(Request::FindOutputs(prefix)).await? {
            Response::Outputs(found) => Ok(found),
            _ => Err(NodeError::UnexpectedResponse("find_outputs")),
        }
    }
}

/// Counts tip movements as the chain reports them, then forwards them.
pub struct MeteredNotifier {
    inner: Arc<dyn WalletNotifier>,
    metrics: Arc<NodeMetrics>,
}

impl MeteredNotifier {
    pub fn new(inner: Arc<dyn WalletNotifier>, metrics: Arc<NodeMetrics>) -> Self {
        Self { inner, metrics }
    }
}

impl WalletNotifier for MeteredNotifier {
    fn notify(&self, event: &WalletEvent) {
        match event {
            WalletEvent::Apply { .. } => self.metrics.blocks_applied.inc(),
            WalletEvent::Rollback { .. } => self.metrics.blocks_rolled_back.inc(),
        }
        self.inner.notify(event);
    }
}

struct ChainService<E: Environment> {
    chain: Blockchain<E>,
    metrics: Arc<NodeMetrics>,
}

impl<E: Environment> ChainService<E> {
    fn handle(&mut self, request: Request) -> Result<Response, NodeError> {
        let response = match request {
            Request::AddHeader(header) => {
                let _span = tracing_spans::header_span(&header.hash(), header.height()).entered();
                let outcome = self.chain.add_header(header)?;
                self.metrics.headers_accepted.inc();
                self.run_update()?;
                Response::HeaderAdded(outcome)
            }
            Request::AddBlock(block) => {
                let _span = tracing_spans::block_span(&block.hash(), block.height()).entered();
                let started = Instant::now();
                let outcome = self.chain.add_block(block, false)?;
                self.metrics
                    .block_process_time_ms
                    .observe(started.elapsed().as_secs_f64() * 1_000.0);
                if let BlockOutcome::Invalid(reason) = &outcome {
                    self.metrics.blocks_invalid.inc();
                    info!(%reason, "block rejected");
                }
                Response::BlockAdded(outcome)
            }
            Request::AddOutputs(outputs) => {
                let added = self.chain.add_outputs(outputs);
                self.run_update()?;
                Response::OutputsAdded(added)
            }
            Request::AddTransaction(skeleton) => match self.chain.add_transaction(skeleton) {
                Ok(outcome) => {
                    self.metrics.transactions_accepted.inc();
                    Response::TransactionAdded(outcome)
                }
                Err(e) => {
                    self.metrics.transactions_rejected.inc();
                    return Err(e.into());
                }
            },
            Request::GiveBlockTemplate(address) => {
                let _span = tracing_spans::template_span().entered();
                Response::Template(Box::new(self.chain.give_block_template(&address)?))
            }
            Request::SubmitSolution(solved) => {
                let _span = tracing_spans::block_span(&solved.hash(), solved.height()).entered();
                let outcome = self.chain.submit_solution(solved)?;
                if let SubmitOutcome::Rejected(reason) = &outcome {
                    self.metrics.blocks_invalid.inc();
                    warn!(%reason, "own solution rejected");
                }
                Response::Solution(outcome)
            }
            Request::Update => Response::Updated(self.run_update()?),
            Request::GetTip => Response::Tip {
                hash: self.chain.current_tip()?,
                height: self.chain.current_height()?,
            },
            Request::GetHeader(hash) => Response::Header(self.chain.header(&hash)?.map(Box::new)),
            Request::GetHeadersAtHeight(height) => {
                Response::Headers(self.chain.headers_at_height(height)?)
            }
            Request::GetBlock(hash) => Response::Block(self.chain.block(&hash)?.map(Box::new)),
            Request::FindOutputs(prefix) => Response::Outputs(self.chain.outputs_by_prefix(&prefix)?),
            Request::GetMempool => Response::Mempool {
                pending: self.chain.mempool().len(),
                included: self.chain.mempool().included().to_vec(),
            },
        };
        self.refresh_gauges()?;
        Ok(response)
    }

    fn run_update(&mut self) -> Result<UpdateSummary, NodeError> {
        let _span = tracing_spans::update_span().entered();
        let summary = self.chain.update()?;
        if summary.changed() {
            debug!(
                added = summary.added,
                rolled_back = summary.rolled_back,
                invalidated = summary.invalidated,
                "tip moved"
            );
        }
        self.metrics.blocks_invalid.inc_by(summary.invalidated as u64);
        Ok(summary)
    }

    fn refresh_gauges(&self) -> Result<(), NodeError> {
        if let Some(height) = self.chain.current_height()? {
            self.metrics.tip_height.set(height as i64);
        }
        self.metrics.mempool_size.set(self.chain.mempool().len() as i64);
        Ok(())
    }
}

/// Start the chain service on the current tokio runtime.
///
/// The task ends when every [`NodeHandle`] is dropped or when `shutdown`
/// fires. A consistency fault answers the failing request, triggers
/// `shutdown` and stops the task, since later writes could compound it.
/// The chain is handed back so the caller can inspect or reopen it.
pub fn spawn_service<E: Environment + 'static>(
    chain: Blockchain<E>,
    metrics: Arc<NodeMetrics>,
    queue: usize,
    shutdown: ShutdownController,
) -> (NodeHandle, JoinHandle<Blockchain<E>>) {
    let (tx, mut rx) = mpsc::channel::<Envelope>(queue.max(1));
    let mut service = ChainService { chain, metrics };
    let mut listener = shutdown.subscribe();
    let task = tokio::spawn(async move {
        if let Err(e) = service.refresh_gauges() {
            warn!(error = %e, "could not read the tip for metrics");
        }
        loop {
            tokio::select! {
                reason = listener.triggered() => {
                    info!(%reason, "chain service stopping");
                    break;
                }
                next = rx.recv() => {
                    let Some((request, reply)) = next else {
                        debug!("all handles dropped, chain service stopping");
                        break;
                    };
                    let action = request.action();
                    let result = {
                        let _span = tracing_spans::request_span(action).entered();
                        service.handle(request)
                    };
                    let fault = match &result {
                        Err(NodeError::Chain(chain)) if chain.is_fatal() => {
                            warn!(action, error = %chain, "consistency fault in chain service");
                            Some(chain.to_string())
                        }
                        Err(e) => {
                            debug!(action, error = %e, "request failed");
                            None
                        }
                        Ok(_) => None,
                    };
                    let _ = reply.send(result);
                    if let Some(detail) = fault {
                        shutdown.trigger(ShutdownReason::ConsistencyFault(detail));
                        break;
                    }
                }
            }
        }
        service.chain
    });
    (NodeHandle { tx }, task)
}
