//! The header DAG: linking, connectivity to genesis, validity, fork choice
//! and path planning towards the best tip.
//!
//! Every header is in one of four states. Unknown headers are not stored.
//! Known headers whose ancestry does not reach genesis wait, either linked
//! under a stored parent or parked as a loose end under a missing one.
//! Connected headers are valid or invalid; invalidity is inherited by
//! every descendant and never cleared.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, info, warn};

use glint_ledger::{next_popow, ContextHeader, Header, HeaderStore};
use glint_store::{ReadTxn, WriteTxn};
use glint_types::{ConsensusParams, Hash256};
use glint_work::{validate_pow, DifficultyAdjuster, PowOracle, Work};

use crate::ChainError;

/// What happened to a header handed to [`HeaderChain::add_header`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeaderOutcome {
    /// The parent is unknown; parked until it arrives.
    Orphan,
    /// Linked under a parent that is not connected to genesis yet.
    Linked,
    /// Connected to genesis and valid.
    Connected,
    /// Connected to genesis but breaks a rule, or descends from a header that does.
    Invalid(String),
}

/// One step of a path from the current tip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    /// Undo blocks until the tip is this hash.
    Rollback(Hash256),
    AddBlock(Hash256),
}

pub struct HeaderChain {
    params: ConsensusParams,
    adjuster: DifficultyAdjuster,
    oracle: Arc<dyn PowOracle>,
    genesis: Hash256,
    skip_pow: bool,
    store: HeaderStore,
}

fn outranks(a: &ContextHeader, b: &ContextHeader) -> bool {
    (a.height(), a.total_difficulty, a.hash) > (b.height(), b.total_difficulty, b.hash)
}

impl HeaderChain {
    pub fn new(
        params: ConsensusParams,
        oracle: Arc<dyn PowOracle>,
        genesis: Hash256,
        skip_pow: bool,
    ) -> Self {
        Self {
            adjuster: DifficultyAdjuster::new(&params),
            params,
            oracle,
            genesis,
            skip_pow,
            store: HeaderStore,
        }
    }

    pub fn params(&self) -> &ConsensusParams {
        &self.params
    }

    pub fn genesis(&self) -> Hash256 {
        self.genesis
    }

    pub fn oracle(&self) -> &dyn PowOracle {
        self.oracle.as_ref()
    }

    pub fn get(
        &self,
        txn: &(impl ReadTxn + ?Sized),
        hash: &Hash256,
    ) -> Result<Option<ContextHeader>, ChainError> {
        Ok(self.store.get(txn, hash)?)
    }

    pub fn contains(&self, txn: &(impl ReadTxn + ?Sized), hash: &Hash256) -> Result<bool, ChainError> {
        Ok(self.store.contains(txn, hash)?)
    }

    fn require(
        &self,
        txn: &(impl ReadTxn + ?Sized),
        hash: &Hash256,
    ) -> Result<ContextHeader, ChainError> {
        self.get(txn, hash)?.ok_or(ChainError::UnknownHeader(*hash))
    }

    pub fn best_tip(&self, txn: &(impl ReadTxn + ?Sized)) -> Result<Option<Hash256>, ChainError> {
        Ok(self.store.best_tip(txn)?)
    }

    pub fn hashes_at_height(
        &self,
        txn: &(impl ReadTxn + ?Sized),
        height: u64,
    ) -> Result<Vec<Hash256>, ChainError> {
        Ok(self.store.hashes_at_height(txn, height)?)
    }

    /// Store a header, link it into the DAG and propagate connectivity.
    pub fn add_header(
        &self,
        txn: &mut (impl WriteTxn + ?Sized),
        header: Header,
    ) -> Result<HeaderOutcome, ChainError> {
        let hash = header.hash();
        if self.store.contains(txn, &hash)? {
            return Err(ChainError::DuplicateHeader(hash));
        }
        if !header.is_self_consistent() {
            return Err(ChainError::MalformedHeader(format!(
                "interlink of {hash} is inconsistent"
            )));
        }
        if header.is_genesis() && hash != self.genesis {
            return Err(ChainError::UnknownGenesis(hash));
        }

        let mut ch = ContextHeader::new(header);
        for child in self.store.take_loose_ends(txn, &hash)? {
            ch.descendants.insert(child);
        }

        let outcome = if ch.header.is_genesis() {
            self.connect(txn, &mut ch, None)?;
            self.outcome_of(&ch)
        } else {
            let prev = ch.prev();
            match self.store.get(txn, &prev)? {
                None => {
                    self.store.add_loose_end(txn, &prev, &hash)?;
                    HeaderOutcome::Orphan
                }
                Some(mut parent) => {
                    parent.descendants.insert(hash);
                    self.store.put(txn, &parent)?;
                    if parent.connected_to_genesis {
                        self.connect(txn, &mut ch, Some(&parent))?;
                        self.outcome_of(&ch)
                    } else {
                        HeaderOutcome::Linked
                    }
                }
            }
        };
        self.store.put(txn, &ch)?;

        if ch.connected_to_genesis {
            self.propagate(txn, ch)?;
        }
        debug!(hash = %hash, ?outcome, "header added");
        Ok(outcome)
    }

    fn outcome_of(&self, ch: &ContextHeader) -> HeaderOutcome {
        if ch.invalid {
            HeaderOutcome::Invalid(ch.reason.clone().unwrap_or_default())
        } else {
            HeaderOutcome::Connected
        }
    }

    /// Mark `ch` connected, derive its cumulative fields from `parent` and
    /// decide its validity. Does not persist.
    fn connect(
        &self,
        txn: &(impl ReadTxn + ?Sized),
        ch: &mut ContextHeader,
        parent: Option<&ContextHeader>,
    ) -> Result<(), ChainError> {
        let work = ch.header.work().unwrap_or(Work::ZERO);
        ch.connected_to_genesis = true;
        match parent {
            None => {
                ch.coins_to_be_mint = self.params.subsidy(0);
                ch.total_difficulty = work;
            }
            Some(parent) => {
                ch.coins_to_be_mint = parent
                    .coins_to_be_mint
                    .saturating_add(self.params.subsidy(ch.height()));
                ch.total_difficulty = parent.total_difficulty + work;
            }
        }

        if let Some(parent) = parent.filter(|p| p.invalid) {
            ch.invalid = true;
            ch.reason = parent.reason.clone();
        } else if let Some(reason) = self.context_violation(txn, ch, parent)? {
            info!(hash = %ch.hash, %reason, "header breaks a consensus rule");
            ch.invalid = true;
            ch.reason = Some(reason);
        }
        Ok(())
    }

    /// Breadth-first connection of everything already hanging below `root`.
    fn propagate(
        &self,
        txn: &mut (impl WriteTxn + ?Sized),
        root: ContextHeader,
    ) -> Result<(), ChainError> {
        let mut queue = VecDeque::from([root]);
        while let Some(parent) = queue.pop_front() {
            if parent.is_valid_connected() {
                self.consider_tip(txn, &parent)?;
            }
            for child_hash in &parent.descendants {
                let Some(mut child) = self.store.get(txn, child_hash)? else {
                    continue;
                };
                if child.connected_to_genesis {
                    continue;
                }
                self.connect(txn, &mut child, Some(&parent))?;
                self.store.put(txn, &child)?;
                queue.push_back(child);
            }
        }
        Ok(())
    }

    fn consider_tip(
        &self,
        txn: &mut (impl WriteTxn + ?Sized),
        candidate: &ContextHeader,
    ) -> Result<(), ChainError> {
        let better = match self.store.best_tip(txn)? {
            None => true,
            Some(current) if current == candidate.hash => false,
            Some(current) => match self.store.get(txn, &current)? {
                Some(current) => !current.is_valid_connected() || outranks(candidate, &current),
                None => true,
            },
        };
        if better {
            self.store.set_best_tip(txn, &candidate.hash)?;
            debug!(hash = %candidate.hash, height = candidate.height(), "new best header");
        }
        Ok(())
    }

    /// Rules a connected header must satisfy given its parent, or `None`
    /// for genesis. Returns the first broken rule.
    fn context_violation(
        &self,
        txn: &(impl ReadTxn + ?Sized),
        ch: &ContextHeader,
        parent: Option<&ContextHeader>,
    ) -> Result<Option<String>, ChainError> {
        let t = &ch.header.template;
        if t.version != self.params.header_version {
            return Ok(Some(format!("unsupported header version {}", t.version)));
        }
        match parent {
            None => {
                if t.height != 0 {
                    return Ok(Some("genesis must sit at height zero".into()));
                }
                if t.bits != self.params.initial_target {
                    return Ok(Some(format!("genesis target {:#010x}", t.bits)));
                }
            }
            Some(parent) => {
                if t.height != parent.height() + 1 {
                    return Ok(Some(format!(
                        "height {} after parent at {}",
                        t.height,
                        parent.height()
                    )));
                }
                if t.popow != next_popow(&parent.header.template.popow, &parent.hash) {
                    return Ok(Some("interlink does not follow from parent".into()));
                }
                if t.timestamp <= parent.header.template.timestamp {
                    return Ok(Some("timestamp does not increase".into()));
                }
                let expected = self.expected_bits(txn, parent)?;
                if t.bits != expected {
                    return Ok(Some(format!(
                        "target {:#010x}, expected {expected:#010x}",
                        t.bits
                    )));
                }
            }
        }
        if t.supply > ch.coins_to_be_mint {
            return Ok(Some(format!(
                "supply {} above mintable {}",
                t.supply, ch.coins_to_be_mint
            )));
        }
        if !t.roots.balances_with(t.supply) {
            return Ok(Some("roots do not balance with supply".into()));
        }
        if !self.skip_pow
            && validate_pow(self.oracle.as_ref(), &t.to_bytes(), ch.header.nonce, t.height, t.bits)
                .is_err()
        {
            return Ok(Some("insufficient proof of work".into()));
        }
        Ok(None)
    }

    /// Target a child of `parent` must carry.
    pub fn expected_bits(
        &self,
        txn: &(impl ReadTxn + ?Sized),
        parent: &ContextHeader,
    ) -> Result<u32, ChainError> {
        let height = parent.height() + 1;
        if !self.params.is_retarget_height(height) {
            return Ok(parent.header.template.bits);
        }
        let first_height = height.saturating_sub(self.adjuster.window());
        let first = self
            .find_ancestor_with_height(txn, &parent.hash, first_height)?
            .ok_or(ChainError::UnknownHeader(parent.hash))?;
        let span = parent
            .header
            .template
            .timestamp
            .saturating_sub(first.header.template.timestamp);
        Ok(self.adjuster.retarget(parent.header.template.bits, span)?)
    }

    /// Mark `hash` and everything below it invalid. Returns the hashes
    /// newly marked.
    pub fn mark_subchain_invalid(
        &self,
        txn: &mut (impl WriteTxn + ?Sized),
        hash: &Hash256,
        reason: &str,
    ) -> Result<Vec<Hash256>, ChainError> {
        let best = self.store.best_tip(txn)?;
        let mut queue = VecDeque::from([*hash]);
        let mut marked = Vec::new();
        while let Some(next) = queue.pop_front() {
            let Some(mut ch) = self.store.get(txn, &next)? else {
                continue;
            };
            if ch.invalid {
                continue;
            }
            ch.invalid = true;
            ch.reason = Some(reason.to_string());
            self.store.put(txn, &ch)?;
            queue.extend(ch.descendants.iter().copied());
            marked.push(next);
        }
        warn!(hash = %hash, %reason, marked = marked.len(), "subchain marked invalid");

        if best.is_some_and(|b| marked.contains(&b)) {
            match self.find_best_tip(txn)? {
                Some(tip) => self.store.set_best_tip(txn, &tip)?,
                None => warn!("no valid header left to serve as best tip"),
            }
        }
        Ok(marked)
    }

    /// Scan down from the highest connected height for the best valid
    /// header: the highest one, ties broken by work then hash.
    pub fn find_best_tip(
        &self,
        txn: &(impl ReadTxn + ?Sized),
    ) -> Result<Option<Hash256>, ChainError> {
        let Some(max) = self.store.max_height(txn)? else {
            return Ok(None);
        };
        for height in (0..=max).rev() {
            let mut best: Option<ContextHeader> = None;
            for hash in self.store.hashes_at_height(txn, height)? {
                let ch = self.require(txn, &hash)?;
                if !ch.is_valid_connected() {
                    continue;
                }
                if best.as_ref().map_or(true, |b| {
                    (ch.total_difficulty, ch.hash) > (b.total_difficulty, b.hash)
                }) {
                    best = Some(ch);
                }
            }
            if let Some(best) = best {
                return Ok(Some(best.hash));
            }
        }
        Ok(None)
    }

    /// Ancestor of `from` at `height`, following the interlink.
    ///
    /// Each hop takes the furthest pointer that does not overshoot, falling
    /// back to nearer ones when a pointed-to header is not stored.
    pub fn find_ancestor_with_height(
        &self,
        txn: &(impl ReadTxn + ?Sized),
        from: &Hash256,
        height: u64,
    ) -> Result<Option<ContextHeader>, ChainError> {
        let Some(mut current) = self.get(txn, from)? else {
            return Ok(None);
        };
        if current.height() < height {
            return Ok(None);
        }
        while current.height() > height {
            let mut next = None;
            let mut last_tried = None;
            for pointer in current.header.template.popow.iter().rev() {
                if last_tried == Some(pointer) {
                    continue;
                }
                last_tried = Some(pointer);
                if let Some(candidate) = self.get(txn, pointer)? {
                    if candidate.height() >= height && candidate.height() < current.height() {
                        next = Some(candidate);
                        break;
                    }
                }
            }
            match next {
                Some(found) => current = found,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// Last common ancestor of two headers.
    pub fn find_bifurcation_point(
        &self,
        txn: &(impl ReadTxn + ?Sized),
        a: &Hash256,
        b: &Hash256,
    ) -> Result<Option<Hash256>, ChainError> {
        let (Some(a), Some(b)) = (self.get(txn, a)?, self.get(txn, b)?) else {
            return Ok(None);
        };
        let height = a.height().min(b.height());
        let (Some(mut a), Some(mut b)) = (
            self.find_ancestor_with_height(txn, &a.hash, height)?,
            self.find_ancestor_with_height(txn, &b.hash, height)?,
        ) else {
            return Ok(None);
        };
        while a.hash != b.hash {
            if a.header.is_genesis() {
                return Ok(None);
            }
            match (self.get(txn, &a.prev())?, self.get(txn, &b.prev())?) {
                (Some(pa), Some(pb)) => {
                    a = pa;
                    b = pb;
                }
                _ => return Ok(None),
            }
        }
        Ok(Some(a.hash))
    }

    /// Steps leading from `at` towards `target`, at most `n` blocks long.
    /// `at` may be zero for a chain without blocks.
    fn path_between(
        &self,
        txn: &(impl ReadTxn + ?Sized),
        at: &Hash256,
        target: &ContextHeader,
        n: usize,
    ) -> Result<Option<(u64, Vec<Action>)>, ChainError> {
        let mut actions = Vec::new();
        let start = if at.is_zero() {
            0
        } else {
            let Some(fork) = self.find_bifurcation_point(txn, at, &target.hash)? else {
                return Ok(None);
            };
            if fork != *at {
                actions.push(Action::Rollback(fork));
            }
            self.require(txn, &fork)?.height() + 1
        };
        if n == 0 || target.height() < start {
            return Ok(Some((start, actions)));
        }
        let end = target.height().min(start + n as u64 - 1);
        let Some(mut cursor) = self.find_ancestor_with_height(txn, &target.hash, end)? else {
            return Ok(None);
        };
        let mut hashes = vec![cursor.hash];
        while cursor.height() > start {
            cursor = self.require(txn, &cursor.prev())?;
            hashes.push(cursor.hash);
        }
        actions.extend(hashes.into_iter().rev().map(Action::AddBlock));
        Ok(Some((start, actions)))
    }

    /// Whether `ancestor` lies on the chain ending at `descendant`.
    fn is_ancestor(
        &self,
        txn: &(impl ReadTxn + ?Sized),
        ancestor: &ContextHeader,
        descendant: &Hash256,
    ) -> Result<bool, ChainError> {
        Ok(self
            .find_ancestor_with_height(txn, descendant, ancestor.height())?
            .is_some_and(|found| found.hash == ancestor.hash))
    }

    /// Candidate paths from `at`, best first.
    ///
    /// The first path leads towards the best tip. The others lead towards
    /// every valid header above the current height that is not on a path
    /// already listed, as long as its fork point is at most `horizon`
    /// blocks below `at`. Higher targets come first, then more work, then
    /// larger hash.
    pub fn next_actions(
        &self,
        txn: &(impl ReadTxn + ?Sized),
        at: &Hash256,
        n: usize,
        horizon: u64,
    ) -> Result<Vec<Vec<Action>>, ChainError> {
        let Some(best) = self.best_tip(txn)? else {
            return Ok(Vec::new());
        };
        let best = self.require(txn, &best)?;
        let mut paths = Vec::new();
        let mut targets = vec![best.hash];
        if let Some((_, path)) = self.path_between(txn, at, &best, n)? {
            if !path.is_empty() {
                paths.push(path);
            }
        }
        if at.is_zero() {
            return Ok(paths);
        }

        let current = self.require(txn, at)?.height();
        let Some(max) = self.store.max_height(txn)? else {
            return Ok(paths);
        };
        let top = max.min(current.saturating_add(n as u64));
        for height in (current + 1..=top).rev() {
            let mut level = Vec::new();
            for hash in self.store.hashes_at_height(txn, height)? {
                let ch = self.require(txn, &hash)?;
                if ch.is_valid_connected() {
                    level.push(ch);
                }
            }
            level.sort_by(|a, b| (b.total_difficulty, b.hash).cmp(&(a.total_difficulty, a.hash)));

            for candidate in level {
                let mut covered = false;
                for target in &targets {
                    if self.is_ancestor(txn, &candidate, target)? {
                        covered = true;
                        break;
                    }
                }
                if covered {
                    continue;
                }
                let Some((start, path)) = self.path_between(txn, at, &candidate, n)? else {
                    continue;
                };
                if current + 1 - start > horizon {
                    continue;
                }
                targets.push(candidate.hash);
                paths.push(path);
            }
        }
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_ledger::{HeaderTemplate, MerkleRoots};
    use glint_nullables::NullEnvironment;
    use glint_store::Environment;
    use glint_work::Blake2bOracle;
    use glint_types::NetworkId;

    fn params() -> ConsensusParams {
        ConsensusParams::for_network(NetworkId::Dev)
    }

    fn genesis_header() -> Header {
        let p = params();
        Header::new(
            HeaderTemplate {
                version: p.header_version,
                height: 0,
                supply: 0,
                roots: MerkleRoots::default(),
                popow: Vec::new(),
                votedata: [0; 8],
                timestamp: p.genesis_timestamp,
                bits: p.initial_target,
            },
            0,
        )
    }

    fn child(parent: &Header, salt: u8) -> Header {
        let t = &parent.template;
        let mut votedata = [0; 8];
        votedata[0] = salt;
        Header::new(
            HeaderTemplate {
                version: t.version,
                height: t.height + 1,
                supply: 0,
                roots: MerkleRoots::default(),
                popow: next_popow(&t.popow, &parent.hash()),
                votedata,
                timestamp: t.timestamp + 60,
                bits: t.bits,
            },
            0,
        )
    }

    fn chain() -> HeaderChain {
        HeaderChain::new(params(), Arc::new(Blake2bOracle), genesis_header().hash(), true)
    }

    fn line(from: &Header, len: usize, salt: u8) -> Vec<Header> {
        let mut out: Vec<Header> = Vec::new();
        for _ in 0..len {
            let parent = out.last().unwrap_or(from).clone();
            out.push(child(&parent, salt));
        }
        out
    }

    #[test]
    fn out_of_order_headers_connect_once_parent_arrives() {
        let env = NullEnvironment::new();
        let hc = chain();
        let genesis = genesis_header();
        let headers = line(&genesis, 3, 0);

        let mut txn = env.write_txn().unwrap();
        assert_eq!(hc.add_header(&mut txn, headers[2].clone()).unwrap(), HeaderOutcome::Orphan);
        assert_eq!(hc.add_header(&mut txn, headers[1].clone()).unwrap(), HeaderOutcome::Orphan);
        assert_eq!(hc.add_header(&mut txn, genesis.clone()).unwrap(), HeaderOutcome::Connected);
        assert_eq!(hc.best_tip(&txn).unwrap(), Some(genesis.hash()));

        assert_eq!(hc.add_header(&mut txn, headers[0].clone()).unwrap(), HeaderOutcome::Connected);
        for h in &headers {
            assert!(hc.get(&txn, &h.hash()).unwrap().unwrap().is_valid_connected());
        }
        assert_eq!(hc.best_tip(&txn).unwrap(), Some(headers[2].hash()));
        let tip = hc.get(&txn, &headers[2].hash()).unwrap().unwrap();
        assert_eq!(tip.coins_to_be_mint, params().subsidy(0) * 4);
    }

    #[test]
    fn duplicate_header_leaves_descendants_alone() {
        let env = NullEnvironment::new();
        let hc = chain();
        let genesis = genesis_header();
        let next = child(&genesis, 0);
        let mut txn = env.write_txn().unwrap();
        hc.add_header(&mut txn, genesis.clone()).unwrap();
        hc.add_header(&mut txn, next.clone()).unwrap();

        let err = hc.add_header(&mut txn, next.clone()).unwrap_err();
        assert!(err.is_dos());
        let stored = hc.get(&txn, &genesis.hash()).unwrap().unwrap();
        assert_eq!(stored.descendants.len(), 1);
    }

    #[test]
    fn foreign_genesis_is_refused() {
        let env = NullEnvironment::new();
        let hc = chain();
        let mut other = genesis_header();
        other.nonce = 99;
        let mut txn = env.write_txn().unwrap();
        assert!(matches!(
            hc.add_header(&mut txn, other),
            Err(ChainError::UnknownGenesis(_))
        ));
    }

    #[test]
    fn broken_rules_invalidate_the_subtree() {
        let env = NullEnvironment::new();
        let hc = chain();
        let genesis = genesis_header();
        let mut bad = child(&genesis, 0);
        bad.template.timestamp = genesis.template.timestamp;
        let below = child(&bad, 0);

        let mut txn = env.write_txn().unwrap();
        hc.add_header(&mut txn, below.clone()).unwrap();
        hc.add_header(&mut txn, genesis.clone()).unwrap();
        assert!(matches!(
            hc.add_header(&mut txn, bad.clone()).unwrap(),
            HeaderOutcome::Invalid(_)
        ));
        let below = hc.get(&txn, &below.hash()).unwrap().unwrap();
        assert!(below.connected_to_genesis && below.invalid);
        assert_eq!(below.reason.as_deref(), Some("timestamp does not increase"));
        assert_eq!(hc.best_tip(&txn).unwrap(), Some(genesis.hash()));
    }

    #[test]
    fn invalidating_the_best_branch_moves_the_tip() {
        let env = NullEnvironment::new();
        let hc = chain();
        let genesis = genesis_header();
        let long = line(&genesis, 3, 1);
        let short = line(&genesis, 2, 2);
        let mut txn = env.write_txn().unwrap();
        hc.add_header(&mut txn, genesis.clone()).unwrap();
        for h in long.iter().chain(&short) {
            hc.add_header(&mut txn, h.clone()).unwrap();
        }
        assert_eq!(hc.best_tip(&txn).unwrap(), Some(long[2].hash()));

        let marked = hc
            .mark_subchain_invalid(&mut txn, &long[0].hash(), "bad block")
            .unwrap();
        assert_eq!(marked.len(), 3);
        assert_eq!(hc.best_tip(&txn).unwrap(), Some(short[1].hash()));
    }

    #[test]
    fn ancestors_and_fork_points() {
        let env = NullEnvironment::new();
        let hc = chain();
        let genesis = genesis_header();
        let trunk = line(&genesis, 40, 0);
        let branch = line(&trunk[9], 5, 7);
        let mut txn = env.write_txn().unwrap();
        hc.add_header(&mut txn, genesis.clone()).unwrap();
        for h in trunk.iter().chain(&branch) {
            hc.add_header(&mut txn, h.clone()).unwrap();
        }

        let tip = trunk[39].hash();
        for height in [0u64, 1, 7, 20, 39, 40] {
            let found = hc.find_ancestor_with_height(&txn, &tip, height).unwrap().unwrap();
            let expected = if height == 0 {
                genesis.hash()
            } else {
                trunk[height as usize - 1].hash()
            };
            assert_eq!(found.hash, expected);
        }
        assert!(hc.find_ancestor_with_height(&txn, &tip, 41).unwrap().is_none());

        let fork = hc
            .find_bifurcation_point(&txn, &tip, &branch[4].hash())
            .unwrap();
        assert_eq!(fork, Some(trunk[9].hash()));
    }

    #[test]
    fn next_actions_lead_to_the_best_tip_first() {
        let env = NullEnvironment::new();
        let hc = chain();
        let genesis = genesis_header();
        let a = line(&genesis, 5, 1);
        let b = line(&a[2], 3, 2);
        let mut txn = env.write_txn().unwrap();
        hc.add_header(&mut txn, genesis.clone()).unwrap();
        for h in a.iter().chain(&b) {
            hc.add_header(&mut txn, h.clone()).unwrap();
        }

        let paths = hc.next_actions(&txn, &a[4].hash(), 16, 10).unwrap();
        assert_eq!(
            paths[0],
            vec![
                Action::Rollback(a[2].hash()),
                Action::AddBlock(b[0].hash()),
                Action::AddBlock(b[1].hash()),
                Action::AddBlock(b[2].hash()),
            ]
        );
        assert_eq!(paths.len(), 1);

        let from_scratch = hc.next_actions(&txn, &Hash256::ZERO, 2, 10).unwrap();
        assert_eq!(
            from_scratch,
            vec![vec![Action::AddBlock(genesis.hash()), Action::AddBlock(a[0].hash())]]
        );
    }

    #[test]
    fn alternative_forks_are_listed_after_the_best() {
        let env = NullEnvironment::new();
        let hc = chain();
        let genesis = genesis_header();
        let trunk = line(&genesis, 2, 1);
        let best = line(&trunk[1], 3, 2);
        let other = line(&trunk[1], 2, 3);
        let mut txn = env.write_txn().unwrap();
        hc.add_header(&mut txn, genesis.clone()).unwrap();
        for h in trunk.iter().chain(&best).chain(&other) {
            hc.add_header(&mut txn, h.clone()).unwrap();
        }

        let paths = hc.next_actions(&txn, &trunk[1].hash(), 8, 4).unwrap();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].last(), Some(&Action::AddBlock(best[2].hash())));
        assert_eq!(
            paths[1],
            vec![Action::AddBlock(other[0].hash()), Action::AddBlock(other[1].hash())]
        );
    }
}
