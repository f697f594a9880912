//! Unmined block templates and matching solved headers back to them.

use glint_crypto::blake2b_256;
use glint_ledger::{Block, ExpiringCache, Header, HeaderTemplate};
use glint_transactions::{Output, TransactionSkeleton};
use glint_types::{Hash256, Timestamp};

use crate::ChainError;

/// What a miner needs: the header to solve plus the block content behind it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockTemplate {
    pub header: HeaderTemplate,
    pub skeleton: TransactionSkeleton,
    pub coinbase: Output,
}

impl BlockTemplate {
    /// Key under which the template is cached: the hash of everything but the nonce.
    pub fn key(&self) -> Hash256 {
        template_key(&self.header)
    }
}

pub fn template_key(header: &HeaderTemplate) -> Hash256 {
    Hash256::new(blake2b_256(&header.to_bytes()))
}

struct Pending {
    skeleton: TransactionSkeleton,
    /// Held back from the provisional pool until a solution arrives.
    coinbase: Output,
}

/// Recently handed out templates, so a solution only has to carry a header.
pub struct TemplateCache {
    templates: ExpiringCache<Hash256, Pending>,
}

impl TemplateCache {
    pub fn new(ttl_secs: u64, capacity: usize) -> Self {
        Self {
            templates: ExpiringCache::new(ttl_secs, capacity),
        }
    }

    pub fn remember(&mut self, template: &BlockTemplate, now: Timestamp) {
        let pending = Pending {
            skeleton: template.skeleton.clone(),
            coinbase: template.coinbase.clone(),
        };
        self.templates.insert(template.key(), pending, now);
    }

    /// Rebuild the full block of a solved header.
    pub fn get_block_by_header_solution(
        &self,
        solved: &Header,
        now: Timestamp,
    ) -> Result<Block, ChainError> {
        self.solve(solved, now).map(|(block, _)| block)
    }

    /// The block of a solved header and the coinbase output it pays.
    pub fn solve(&self, solved: &Header, now: Timestamp) -> Result<(Block, Output), ChainError> {
        let pending = self
            .templates
            .get(&template_key(&solved.template), now)
            .ok_or(ChainError::UnknownTemplate)?;
        Ok((
            Block::new(solved.clone(), pending.skeleton.clone()),
            pending.coinbase.clone(),
        ))
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
