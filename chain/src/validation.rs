//! Context verification: the checks that need the ledger.
//!
//! A broken rule is reported as `Ok(Some(reason))`; `Err` is reserved for
//! failures of the node itself.

use glint_ledger::{Block, ExpiringCache, Ledger, LedgerError};
use glint_store::{ReadTxn, WriteTxn};
use glint_transactions::{non_context_verify, Transaction, TransactionError, VerifyMode};
use glint_types::{ConsensusParams, Hash256, Timestamp};

use crate::ChainError;

/// Remembers which transactions already passed non-context verification.
pub struct VerificationCache {
    verified: ExpiringCache<(Hash256, Option<u64>), ()>,
}

impl VerificationCache {
    pub fn new(ttl_secs: u64, capacity: usize) -> Self {
        Self {
            verified: ExpiringCache::new(ttl_secs, capacity),
        }
    }

    pub fn verify(
        &mut self,
        tx: &Transaction,
        params: &ConsensusParams,
        mode: VerifyMode,
        now: Timestamp,
    ) -> Result<(), TransactionError> {
        let height = match mode {
            VerifyMode::Standalone => None,
            VerifyMode::Block { height } => Some(height),
        };
        let key = (tx.id(), height);
        if self.verified.contains(&key, now) {
            return Ok(());
        }
        non_context_verify(tx, params, mode)?;
        self.verified.insert(key, (), now);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.verified.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verified.is_empty()
    }
}

/// Inputs must exist unspent, be mature at `height` and carry the burden
/// recorded for them. With `allow_pool`, unconfirmed pooled outputs count
/// as spendable too; their lock height still applies and their burden is
/// the one carried by the pooled copy.
pub fn input_violation(
    ledger: &Ledger,
    txn: &(impl ReadTxn + ?Sized),
    tx: &Transaction,
    height: u64,
    allow_pool: bool,
) -> Result<Option<String>, ChainError> {
    for input in &tx.inputs {
        let index = input.index();
        let recorded = if ledger.outputs().is_unspent(txn, &index)? {
            ledger.burdens().get(txn, &index)?
        } else {
            match ledger.outputs().pool().get(&index) {
                Some(pooled) if allow_pool => pooled.burden,
                _ => return Ok(Some(format!("input {index} is not an unspent output"))),
            }
        };
        if input.lock_height > height {
            return Ok(Some(format!(
                "input {index} locked until {}",
                input.lock_height
            )));
        }
        if recorded != input.burden {
            return Ok(Some(format!("burden record of {index} disagrees")));
        }
    }
    Ok(None)
}

/// No output or excess may already be on the chain.
pub fn novelty_violation(
    ledger: &Ledger,
    txn: &(impl ReadTxn + ?Sized),
    tx: &Transaction,
) -> Result<Option<String>, ChainError> {
    for output in &tx.outputs {
        let index = output.index();
        if ledger.outputs().was_confirmed(txn, &index)? {
            return Ok(Some(format!("output {index} already exists")));
        }
        if ledger.excesses().contains(txn, &output.address.index())? {
            return Ok(Some(format!("address excess of {index} already used")));
        }
    }
    for excess in &tx.additional_excesses {
        let index = excess.index();
        if ledger.excesses().contains(txn, &index)? {
            return Ok(Some(format!("excess {index} already used")));
        }
    }
    Ok(None)
}

/// Everything a block must satisfy on top of its parent's ledger state.
///
/// `parent_supply` is `None` for genesis. Speculative application may
/// leave `txn` dirty when a rule is broken; the caller must abort it.
pub fn block_violation(
    ledger: &Ledger,
    txn: &mut (impl WriteTxn + ?Sized),
    params: &ConsensusParams,
    block: &Block,
    tx: &Transaction,
    parent_supply: Option<u64>,
) -> Result<Option<String>, ChainError> {
    let height = block.height();
    let header = &block.header.template;

    let Some(coinbase) = tx.coinbase() else {
        return Ok(Some("block has no coinbase".into()));
    };
    let subsidy = params.subsidy(height);
    let relay_fee = match tx.relay_fee() {
        Ok(fee) => fee,
        Err(e) => return Ok(Some(e.to_string())),
    };
    let minted = coinbase.transparent_value();
    if minted.map(u128::from) != Some(u128::from(subsidy) + u128::from(relay_fee)) {
        return Ok(Some(format!(
            "coinbase mints {minted:?}, allowed {subsidy} plus {relay_fee} in fees"
        )));
    }

    let supply = i128::from(parent_supply.unwrap_or(0)) + i128::from(subsidy)
        - tx.creation_fee(params);
    if supply != i128::from(header.supply) {
        return Ok(Some(format!(
            "header supply {} but block leaves {supply}",
            header.supply
        )));
    }

    if let Some(reason) = input_violation(ledger, txn, tx, height, false)? {
        return Ok(Some(reason));
    }
    if let Some(reason) = novelty_violation(ledger, txn, tx)? {
        return Ok(Some(reason));
    }

    let roots = match ledger.speculative_roots(txn, tx) {
        Ok(roots) => roots,
        Err(
            e @ (LedgerError::UnknownInput(_)
            | LedgerError::DuplicateOutput(_)
            | LedgerError::DuplicateExcess(_)),
        ) => return Ok(Some(e.to_string())),
        Err(e) => return Err(e.into()),
    };
    if roots != header.roots {
        return Ok(Some("merkle roots differ from the header".into()));
    }
    Ok(None)
}
