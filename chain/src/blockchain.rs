//! The chain state machine.
//!
//! The tip only moves inside [`Blockchain::update`], which follows candidate
//! paths from the header chain one block at a time. Each block application
//! and each rollback is one write transaction: either all of it lands or
//! none of it does.

use std::sync::Arc;

use tracing::{debug, info, warn};

use glint_crypto::SecretKey;
use glint_ledger::{
    next_popow, Block, ContextBlock, ContextHeader, Header, HeaderTemplate, Ledger, Materialized,
    MerkleRoots, OutputMatch, ProvisionalPool,
};
use glint_store::{Environment, ReadTxn, WriteTxn};
use glint_transactions::{
    coinbase_transaction, Output, OutputIndex, Transaction, TransactionError, TransactionSkeleton,
    VerifyMode,
};
use glint_types::{Clock, ConsensusParams, Hash256, SystemClock, Timestamp};
use glint_work::PowOracle;

use crate::collaborators::{
    DownloadScheduler, NoopNotifier, NoopScheduler, WalletEvent, WalletNotifier,
};
use crate::download::{DownloadTracker, Wanted};
use crate::genesis::{build_genesis, genesis_transaction};
use crate::header_chain::{Action, HeaderChain, HeaderOutcome};
use crate::mempool::{fate, Fate, Mempool};
use crate::template::{BlockTemplate, TemplateCache};
use crate::validation::{block_violation, VerificationCache};
use crate::{ChainConfig, ChainError};

/// Result of [`Blockchain::add_block`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlockOutcome {
    /// Stored and verified; the tip may have moved.
    Accepted,
    /// Stored, but these outputs have to arrive before it can be checked.
    NotDownloaded(Vec<OutputIndex>),
    /// Stored and marked invalid together with its descendants.
    Invalid(String),
}

/// Result of [`Blockchain::add_transaction`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxOutcome {
    Accepted(Hash256),
    /// Pooled, waiting for these outputs.
    NotDownloaded(Vec<OutputIndex>),
}

/// Result of [`Blockchain::submit_solution`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted(Hash256),
    /// The chain already reached the template's height.
    Stale,
    Rejected(String),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    pub added: usize,
    pub rolled_back: usize,
    pub invalidated: usize,
}

impl UpdateSummary {
    pub fn changed(&self) -> bool {
        self.added + self.rolled_back + self.invalidated > 0
    }
}

enum Step {
    Applied,
    Missing,
    Invalid,
}

/// Everything outside the consensus core the chain talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub scheduler: Arc<dyn DownloadScheduler>,
    pub notifier: Arc<dyn WalletNotifier>,
    pub clock: Arc<dyn Clock>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            scheduler: Arc::new(NoopScheduler),
            notifier: Arc::new(NoopNotifier),
            clock: Arc::new(SystemClock),
        }
    }
}

pub struct Blockchain<E: Environment> {
    env: Arc<E>,
    params: ConsensusParams,
    config: ChainConfig,
    ledger: Ledger,
    headers: HeaderChain,
    mempool: Mempool,
    verification: VerificationCache,
    templates: TemplateCache,
    downloads: DownloadTracker,
    collaborators: Collaborators,
    genesis: Block,
}

impl<E: Environment> Blockchain<E> {
    /// Open the chain stored in `env`, bootstrapping genesis into an empty store.
    pub fn open(
        env: Arc<E>,
        params: ConsensusParams,
        config: ChainConfig,
        oracle: Arc<dyn PowOracle>,
        collaborators: Collaborators,
    ) -> Result<Self, ChainError> {
        let genesis = build_genesis(&params, oracle.as_ref())?;
        let headers = HeaderChain::new(
            params.clone(),
            oracle,
            genesis.hash(),
            config.skip_pow_check,
        );
        let mut chain = Self {
            mempool: Mempool::new(config.mempool_capacity, config.verification_cache_ttl_secs),
            verification: VerificationCache::new(
                config.verification_cache_ttl_secs,
                config.verification_cache_capacity,
            ),
            templates: TemplateCache::new(config.template_ttl_secs, config.template_cache_capacity),
            downloads: DownloadTracker::new(),
            ledger: Ledger::with_pool(ProvisionalPool::with_limits(
                config.provisional_ttl_secs,
                config.provisional_capacity,
            )),
            env,
            params,
            config,
            headers,
            collaborators,
            genesis,
        };
        chain.bootstrap()?;
        Ok(chain)
    }

    fn bootstrap(&mut self) -> Result<(), ChainError> {
        let env = Arc::clone(&self.env);
        let hash = self.genesis.hash();
        let mut txn = env.write_txn()?;
        if !self.headers.contains(&txn, &hash)? {
            self.headers.add_header(&mut txn, self.genesis.header.clone())?;
            self.ledger
                .blocks()
                .put(&mut txn, &ContextBlock::new(self.genesis.clone()))?;
            info!(genesis = %hash, network = %self.params.network, "initialised empty chain");
        }
        let tip = self.ledger.current_tip(&txn)?;
        txn.commit()?;

        if tip.is_zero() {
            let now = self.collaborators.clock.now();
            for output in genesis_transaction(&self.params)?.outputs {
                self.ledger.add_provisional(output, now);
            }
        }
        self.update()?;
        Ok(())
    }

    pub fn params(&self) -> &ConsensusParams {
        &self.params
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn genesis(&self) -> &Block {
        &self.genesis
    }

    pub fn mempool(&self) -> &Mempool {
        &self.mempool
    }

    /// Outputs held in the provisional pool.
    pub fn provisional_count(&self) -> usize {
        self.ledger.outputs().pool().len()
    }

    // ── Queries ──────────────────────────────────────────────────────────

    /// Hash of the last applied block; zero before genesis.
    pub fn current_tip(&self) -> Result<Hash256, ChainError> {
        let txn = self.env.read_txn()?;
        Ok(self.ledger.current_tip(&txn)?)
    }

    /// Height of the last applied block; `None` before genesis.
    pub fn current_height(&self) -> Result<Option<u64>, ChainError> {
        let txn = self.env.read_txn()?;
        let tip = self.ledger.current_tip(&txn)?;
        self.height_of(&txn, &tip)
    }

    fn height_of(
        &self,
        txn: &(impl ReadTxn + ?Sized),
        hash: &Hash256,
    ) -> Result<Option<u64>, ChainError> {
        if hash.is_zero() {
            return Ok(None);
        }
        let header = self
            .headers
            .get(txn, hash)?
            .ok_or(ChainError::UnknownHeader(*hash))?;
        Ok(Some(header.height()))
    }

    /// Accumulator roots of the current ledger state.
    pub fn roots(&self) -> Result<MerkleRoots, ChainError> {
        let txn = self.env.read_txn()?;
        Ok(self.ledger.roots(&txn)?)
    }

    /// Best valid header known, whether or not its blocks are here.
    pub fn best_header(&self) -> Result<Option<Hash256>, ChainError> {
        let txn = self.env.read_txn()?;
        self.headers.best_tip(&txn)
    }

    pub fn header(&self, hash: &Hash256) -> Result<Option<ContextHeader>, ChainError> {
        let txn = self.env.read_txn()?;
        self.headers.get(&txn, hash)
    }

    pub fn headers_at_height(&self, height: u64) -> Result<Vec<Header>, ChainError> {
        let txn = self.env.read_txn()?;
        let mut headers = Vec::new();
        for hash in self.headers.hashes_at_height(&txn, height)? {
            if let Some(ch) = self.headers.get(&txn, &hash)? {
                headers.push(ch.header);
            }
        }
        Ok(headers)
    }

    pub fn block(&self, hash: &Hash256) -> Result<Option<Block>, ChainError> {
        let txn = self.env.read_txn()?;
        Ok(self.ledger.blocks().get(&txn, hash)?.map(|cb| cb.block))
    }

    /// The full transaction of a stored block, if all its outputs are here.
    pub fn block_transaction(&self, hash: &Hash256) -> Result<Option<Transaction>, ChainError> {
        let txn = self.env.read_txn()?;
        let Some(cb) = self.ledger.blocks().get(&txn, hash)? else {
            return Ok(None);
        };
        Ok(match self.ledger.materialize(&txn, &cb.block.skeleton)? {
            Materialized::Complete(tx) => Some(tx),
            Materialized::Missing(_) => None,
        })
    }

    /// Confirmed and archived outputs whose index starts with `prefix`.
    pub fn outputs_by_prefix(&self, prefix: &[u8]) -> Result<Vec<OutputMatch>, ChainError> {
        let txn = self.env.read_txn()?;
        Ok(self.ledger.outputs().fuzzy_search(&txn, prefix)?)
    }

    pub fn output(&self, index: &OutputIndex) -> Result<Option<Output>, ChainError> {
        let txn = self.env.read_txn()?;
        Ok(self.ledger.outputs().resolve(&txn, index)?)
    }

    pub fn is_unspent(&self, index: &OutputIndex) -> Result<bool, ChainError> {
        let txn = self.env.read_txn()?;
        Ok(self.ledger.outputs().is_unspent(&txn, index)?)
    }

    // ── Incoming data ────────────────────────────────────────────────────

    pub fn add_header(&mut self, header: Header) -> Result<HeaderOutcome, ChainError> {
        let env = Arc::clone(&self.env);
        let mut txn = env.write_txn()?;
        let outcome = self.headers.add_header(&mut txn, header)?;
        txn.commit()?;
        Ok(outcome)
    }

    /// Place peer-delivered outputs in the provisional pool. Outputs that
    /// fail their own checks are skipped. Returns how many were new.
    pub fn add_outputs(&mut self, outputs: Vec<Output>) -> usize {
        let now = self.collaborators.clock.now();
        let mut added = 0;
        for output in outputs {
            let index = output.index();
            if let Err(e) = output.verify() {
                debug!(output = %index, error = %e, "ignoring delivered output");
                continue;
            }
            self.downloads.arrived(&Wanted::Output(index));
            if self.ledger.add_provisional(output, now) {
                added += 1;
            }
        }
        added
    }

    /// Store a block and, unless `defer_update`, try to advance the tip.
    pub fn add_block(&mut self, block: Block, defer_update: bool) -> Result<BlockOutcome, ChainError> {
        let hash = block.hash();
        let env = Arc::clone(&self.env);
        let mut txn = env.write_txn()?;
        if self.ledger.blocks().contains(&txn, &hash)? {
            return Err(ChainError::DuplicateBlock(hash));
        }
        if !self.headers.contains(&txn, &hash)? {
            self.headers.add_header(&mut txn, block.header.clone())?;
        }
        self.ledger
            .blocks()
            .put(&mut txn, &ContextBlock::new(block.clone()))?;
        let header = self
            .headers
            .get(&txn, &hash)?
            .ok_or(ChainError::UnknownHeader(hash))?;
        txn.commit()?;
        self.downloads.arrived(&Wanted::Block(hash));

        if header.invalid {
            let reason = header.reason.unwrap_or_default();
            let mut txn = env.write_txn()?;
            self.ledger.blocks().mark_invalid(&mut txn, &hash, &reason)?;
            txn.commit()?;
            return Ok(BlockOutcome::Invalid(reason));
        }

        let materialized = {
            let txn = env.read_txn()?;
            self.ledger.materialize(&txn, &block.skeleton)?
        };
        let tx = match materialized {
            Materialized::Complete(tx) => tx,
            Materialized::Missing(missing) => {
                debug!(block = %hash, missing = missing.len(), "block waits for outputs");
                self.request(Vec::new(), missing.clone());
                return Ok(BlockOutcome::NotDownloaded(missing));
            }
        };

        let now = self.collaborators.clock.now();
        let mode = VerifyMode::Block {
            height: block.height(),
        };
        if let Err(e) = self.verification.verify(&tx, &self.params, mode, now) {
            let reason = e.to_string();
            self.invalidate(&hash, &reason)?;
            return Ok(BlockOutcome::Invalid(reason));
        }

        if !defer_update {
            self.update()?;
            let txn = env.read_txn()?;
            if let Some(cb) = self.ledger.blocks().get(&txn, &hash)? {
                if cb.invalid {
                    return Ok(BlockOutcome::Invalid(cb.reason.unwrap_or_default()));
                }
            }
        }
        Ok(BlockOutcome::Accepted)
    }

    /// Pool a transaction for the next blocks.
    pub fn add_transaction(
        &mut self,
        skeleton: TransactionSkeleton,
    ) -> Result<TxOutcome, ChainError> {
        let id = skeleton.id();
        if self.mempool.contains(&id) {
            return Err(ChainError::DuplicateTransaction(id));
        }
        let size = skeleton.size();
        if size > self.params.max_tx_size {
            return Err(TransactionError::TooLarge {
                size,
                max: self.params.max_tx_size,
            }
            .into());
        }

        let env = Arc::clone(&self.env);
        let txn = env.read_txn()?;
        let now = self.collaborators.clock.now();
        let tip = self.ledger.current_tip(&txn)?;
        let height = self.height_of(&txn, &tip)?.map_or(0, |h| h + 1);
        match self.ledger.materialize(&txn, &skeleton)? {
            Materialized::Missing(missing) => {
                drop(txn);
                self.mempool.insert(skeleton)?;
                self.request(Vec::new(), missing.clone());
                return Ok(TxOutcome::NotDownloaded(missing));
            }
            Materialized::Complete(tx) => {
                self.verification
                    .verify(&tx, &self.params, VerifyMode::Standalone, now)?;
                if let Fate::Drop(reason) = fate(&self.ledger, &txn, &self.params, &tx, size, height)? {
                    return Err(ChainError::Violation(reason));
                }
            }
        }
        self.mempool.insert(skeleton)?;
        self.mempool.update_current_set(
            &self.ledger,
            &txn,
            &self.params,
            height,
            &mut self.verification,
            now,
        )?;
        debug!(tx = %id, "transaction pooled");
        Ok(TxOutcome::Accepted(id))
    }

    fn request(&mut self, blocks: Vec<Hash256>, outputs: Vec<OutputIndex>) {
        let now = self.collaborators.clock.now();
        let wanted = blocks
            .into_iter()
            .map(Wanted::Block)
            .chain(outputs.into_iter().map(Wanted::Output));
        let mut due_blocks = Vec::new();
        let mut due_outputs = Vec::new();
        for item in self.downloads.due(wanted, now) {
            match item {
                Wanted::Block(hash) => due_blocks.push(hash),
                Wanted::Output(index) => due_outputs.push(index),
            }
        }
        if !due_blocks.is_empty() {
            self.collaborators.scheduler.request_blocks(&due_blocks);
        }
        if !due_outputs.is_empty() {
            self.collaborators.scheduler.request_outputs(&due_outputs);
        }
    }

    fn invalidate(&mut self, hash: &Hash256, reason: &str) -> Result<usize, ChainError> {
        let env = Arc::clone(&self.env);
        let mut txn = env.write_txn()?;
        let marked = self.headers.mark_subchain_invalid(&mut txn, hash, reason)?;
        for block in &marked {
            self.ledger.blocks().mark_invalid(&mut txn, block, reason)?;
        }
        txn.commit()?;
        Ok(marked.len())
    }

    // ── Moving the tip ───────────────────────────────────────────────────

    /// Follow the best reachable path until nothing more can be done.
    pub fn update(&mut self) -> Result<UpdateSummary, ChainError> {
        let mut total = UpdateSummary::default();
        for _ in 0..self.config.max_update_iterations {
            let Some(path) = self.choose_path()? else {
                return Ok(total);
            };
            let step = self.follow(&path)?;
            total.added += step.added;
            total.rolled_back += step.rolled_back;
            total.invalidated += step.invalidated;
            if !step.changed() {
                return Ok(total);
            }
        }
        warn!(
            iterations = self.config.max_update_iterations,
            "update stopped at its iteration guard"
        );
        Ok(total)
    }

    /// The first candidate path whose available prefix ends higher than
    /// the current tip. Everything missing along any path is requested.
    fn choose_path(&mut self) -> Result<Option<Vec<Action>>, ChainError> {
        let env = Arc::clone(&self.env);
        let txn = env.read_txn()?;
        let tip = self.ledger.current_tip(&txn)?;
        let current = self.height_of(&txn, &tip)?;
        let paths = self.headers.next_actions(
            &txn,
            &tip,
            self.config.max_path_steps,
            self.config.fork_horizon,
        )?;

        let mut missing_blocks = Vec::new();
        let mut missing_outputs = Vec::new();
        let mut chosen = None;
        for path in paths {
            let mut reach = current;
            let mut usable = Vec::new();
            for action in path {
                match action {
                    Action::Rollback(to) => {
                        reach = self.height_of(&txn, &to)?;
                        usable.push(action);
                    }
                    Action::AddBlock(hash) => match self.ledger.blocks().get(&txn, &hash)? {
                        None => {
                            missing_blocks.push(hash);
                            break;
                        }
                        Some(cb) if cb.invalid => break,
                        Some(cb) => match self.ledger.materialize(&txn, &cb.block.skeleton)? {
                            Materialized::Missing(missing) => {
                                missing_outputs.extend(missing);
                                break;
                            }
                            Materialized::Complete(_) => {
                                reach = Some(cb.block.height());
                                usable.push(action);
                            }
                        },
                    },
                }
            }
            let progress = match (reach, current) {
                (Some(reach), Some(current)) => reach > current,
                (Some(_), None) => true,
                (None, _) => false,
            };
            if progress && chosen.is_none() {
                chosen = Some(usable);
            }
        }
        drop(txn);
        self.request(missing_blocks, missing_outputs);
        Ok(chosen)
    }

    fn follow(&mut self, path: &[Action]) -> Result<UpdateSummary, ChainError> {
        let mut summary = UpdateSummary::default();
        for action in path {
            match action {
                Action::Rollback(to) => {
                    while self.current_tip()? != *to {
                        self.rollback_tip()?;
                        summary.rolled_back += 1;
                    }
                }
                Action::AddBlock(hash) => match self.add_block_to_chain(hash)? {
                    Step::Applied => summary.added += 1,
                    Step::Missing => break,
                    Step::Invalid => {
                        summary.invalidated += 1;
                        break;
                    }
                },
            }
        }
        Ok(summary)
    }

    /// Apply one stored block on top of the current tip.
    fn add_block_to_chain(&mut self, hash: &Hash256) -> Result<Step, ChainError> {
        let env = Arc::clone(&self.env);
        let now = self.collaborators.clock.now();
        let mut txn = env.write_txn()?;
        let Some(cb) = self.ledger.blocks().get(&txn, hash)? else {
            return Ok(Step::Missing);
        };
        let block = cb.block;
        let tip = self.ledger.current_tip(&txn)?;
        if block.header.prev() != tip {
            return Err(ChainError::TipMismatch { block: *hash, tip });
        }
        let tx = match self.ledger.materialize(&txn, &block.skeleton)? {
            Materialized::Complete(tx) => tx,
            Materialized::Missing(missing) => {
                drop(txn);
                self.request(Vec::new(), missing);
                return Ok(Step::Missing);
            }
        };

        let height = block.height();
        let parent_supply = match self.headers.get(&txn, &tip)? {
            Some(parent) => Some(parent.header.template.supply),
            None if tip.is_zero() => None,
            None => return Err(ChainError::UnknownHeader(tip)),
        };
        let mode = VerifyMode::Block { height };
        let violation = match self.verification.verify(&tx, &self.params, mode, now) {
            Err(e) => Some(e.to_string()),
            Ok(()) => block_violation(
                &self.ledger,
                &mut txn,
                &self.params,
                &block,
                &tx,
                parent_supply,
            )?,
        };
        if let Some(reason) = violation {
            drop(txn);
            info!(block = %hash, height, %reason, "block rejected");
            self.invalidate(hash, &reason)?;
            return Ok(Step::Invalid);
        }

        let rollback = self.ledger.apply_tx(&mut txn, &tx, hash)?;
        self.ledger.rollbacks().put(&mut txn, hash, &rollback)?;
        txn.commit()?;
        self.ledger.confirm_provisional(&tx);
        self.refresh_mempool(height + 1, now)?;

        info!(block = %hash, height, inputs = tx.inputs.len(), outputs = tx.outputs.len(), "block applied");
        self.collaborators.notifier.notify(&WalletEvent::Apply {
            block: *hash,
            height,
            tx,
        });
        Ok(Step::Applied)
    }

    /// Undo the block at the tip.
    fn rollback_tip(&mut self) -> Result<(), ChainError> {
        let env = Arc::clone(&self.env);
        let now = self.collaborators.clock.now();
        let mut txn = env.write_txn()?;
        let tip = self.ledger.current_tip(&txn)?;
        let Some(height) = self.height_of(&txn, &tip)? else {
            return Err(ChainError::NoTip);
        };
        let rollback = self.ledger.rollbacks().take(&mut txn, &tip)?;
        let restored = self.ledger.rollback(&mut txn, &rollback)?;
        txn.commit()?;
        self.ledger.restore_provisional(restored, now);
        self.refresh_mempool(height, now)?;

        info!(block = %tip, height, "block rolled back");
        self.collaborators.notifier.notify(&WalletEvent::Rollback {
            block: tip,
            height,
            rollback,
        });
        Ok(())
    }

    /// Re-select the mempool against committed state.
    fn refresh_mempool(&mut self, height: u64, now: Timestamp) -> Result<(), ChainError> {
        let env = Arc::clone(&self.env);
        let txn = env.read_txn()?;
        self.mempool.update_current_set(
            &self.ledger,
            &txn,
            &self.params,
            height,
            &mut self.verification,
            now,
        )
    }

    // ── Mining ───────────────────────────────────────────────────────────

    /// Assemble an unmined block on top of the current tip paying `address`.
    pub fn give_block_template(&mut self, address: &SecretKey) -> Result<BlockTemplate, ChainError> {
        let env = Arc::clone(&self.env);
        let now = self.collaborators.clock.now();
        let mut txn = env.write_txn()?;
        let tip = self.ledger.current_tip(&txn)?;
        if tip.is_zero() {
            return Err(ChainError::NoTip);
        }
        let parent = self
            .headers
            .get(&txn, &tip)?
            .ok_or(ChainError::UnknownHeader(tip))?;
        let height = parent.height() + 1;

        self.mempool.update_current_set(
            &self.ledger,
            &txn,
            &self.params,
            height,
            &mut self.verification,
            now,
        )?;
        let extra = self.mempool.combined_tx().clone();
        let subsidy = self.params.subsidy(height);
        let reward = subsidy
            .checked_add(extra.relay_fee()?)
            .ok_or(TransactionError::FeeOverflow)?;
        let (coinbase_tx, coinbase) = coinbase_transaction(&self.params, reward, height, address)?;
        let tx = coinbase_tx.merge(&extra)?;
        self.verification
            .verify(&tx, &self.params, VerifyMode::Block { height }, now)?;

        let supply = i128::from(parent.header.template.supply) + i128::from(subsidy)
            - tx.creation_fee(&self.params);
        let supply = u64::try_from(supply)
            .map_err(|_| ChainError::Violation(format!("template supply {supply} out of range")))?;
        let bits = self.headers.expected_bits(&txn, &parent)?;
        let roots = self.ledger.speculative_roots(&mut txn, &tx)?;
        // speculative work is never committed
        drop(txn);

        let parent_time = parent.header.template.timestamp;
        let template = BlockTemplate {
            header: HeaderTemplate {
                version: self.params.header_version,
                height,
                supply,
                roots,
                popow: next_popow(&parent.header.template.popow, &parent.hash),
                votedata: [0; 8],
                timestamp: now.as_secs().max(parent_time + 1),
                bits,
            },
            skeleton: tx.skeleton(),
            coinbase: coinbase.output,
        };
        self.templates.remember(&template, now);
        debug!(height, transactions = self.mempool.included().len(), "block template assembled");
        Ok(template)
    }

    /// The block a solved template header stands for.
    pub fn get_block_by_header_solution(&self, solved: &Header) -> Result<Block, ChainError> {
        self.templates
            .get_block_by_header_solution(solved, self.collaborators.clock.now())
    }

    /// Turn a solved template into a block and feed it to the chain.
    pub fn submit_solution(&mut self, solved: Header) -> Result<SubmitOutcome, ChainError> {
        let now = self.collaborators.clock.now();
        let (block, coinbase) = self.templates.solve(&solved, now)?;
        if self
            .current_height()?
            .is_some_and(|current| solved.height() <= current)
        {
            debug!(height = solved.height(), "stale solution");
            return Ok(SubmitOutcome::Stale);
        }
        self.ledger.add_provisional(coinbase, now);
        let hash = block.hash();
        Ok(match self.add_block(block, false)? {
            BlockOutcome::Accepted => SubmitOutcome::Accepted(hash),
            BlockOutcome::Invalid(reason) => SubmitOutcome::Rejected(reason),
            BlockOutcome::NotDownloaded(_) => {
                SubmitOutcome::Rejected("template outputs are no longer available".into())
            }
        })
    }
}
