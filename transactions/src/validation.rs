//! Non-context verification: everything checkable from the transaction alone.
//!
//! The balance equation is
//!
//! ```text
//! Σ apc(in) + Σ address(out) + Σ excess + mint*H == Σ apc(out) + fee*H
//! ```
//!
//! with a negative fee moved to the left-hand side.

use rayon::prelude::*;

use glint_crypto::{sum_points, value_point, RistrettoPoint};
use glint_types::ConsensusParams;

use crate::excess::Excess;
use crate::output::{Output, RangeProof};
use crate::transaction::Transaction;
use crate::TransactionError;

/// Where a transaction is being verified.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerifyMode {
    /// Relayed or pooled on its own; a coinbase is not allowed.
    Standalone,
    /// As the transaction of the block at `height`.
    Block { height: u64 },
}

pub fn non_context_verify(
    tx: &Transaction,
    params: &ConsensusParams,
    mode: VerifyMode,
) -> Result<(), TransactionError> {
    let size = tx.skeleton().size();
    if size > params.max_tx_size {
        return Err(TransactionError::TooLarge {
            size,
            max: params.max_tx_size,
        });
    }

    verify_ordering(tx)?;
    verify_coinbase(tx, params, mode)?;

    tx.outputs.par_iter().try_for_each(Output::verify)?;

    verify_claims(tx)?;
    verify_burdens(tx)?;
    verify_balance(tx, params)
}

fn strictly_sorted<T: Ord>(items: &[T]) -> bool {
    items.windows(2).all(|w| w[0] < w[1])
}

fn verify_ordering(tx: &Transaction) -> Result<(), TransactionError> {
    let outputs = tx.output_indexes();
    if !strictly_sorted(&outputs) {
        // distinguish plain duplicates for the caller
        let mut sorted = outputs.clone();
        sorted.sort();
        if let Some(w) = sorted.windows(2).find(|w| w[0] == w[1]) {
            return Err(TransactionError::DuplicateOutput(w[0].to_string()));
        }
        return Err(TransactionError::NotSorted("outputs"));
    }
    if !strictly_sorted(&tx.input_indexes()) {
        return Err(TransactionError::NotSorted("inputs"));
    }
    let excesses = tx.excess_indexes();
    if !strictly_sorted(&excesses) {
        let mut sorted = excesses.clone();
        sorted.sort();
        if let Some(w) = sorted.windows(2).find(|w| w[0] == w[1]) {
            return Err(TransactionError::DuplicateExcess(w[0].to_string()));
        }
        return Err(TransactionError::NotSorted("excesses"));
    }
    Ok(())
}

fn verify_coinbase(
    tx: &Transaction,
    params: &ConsensusParams,
    mode: VerifyMode,
) -> Result<(), TransactionError> {
    let mut coinbases = tx.outputs.iter().filter(|o| o.is_coinbase());
    let Some(coinbase) = coinbases.next() else {
        return Ok(());
    };
    if coinbases.next().is_some() {
        return Err(TransactionError::MultipleCoinbase);
    }
    let VerifyMode::Block { height } = mode else {
        return Err(TransactionError::UnexpectedCoinbase);
    };
    if !matches!(coinbase.range_proof, RangeProof::Transparent { .. }) {
        return Err(TransactionError::OpaqueCoinbase);
    }
    let required = params.coinbase_lock_height(height);
    if coinbase.lock_height < required {
        return Err(TransactionError::CoinbaseNotLocked {
            lock_height: coinbase.lock_height,
            required,
        });
    }
    Ok(())
}

/// Every additional excess signs the APC of a distinct output.
fn verify_claims(tx: &Transaction) -> Result<(), TransactionError> {
    let mut claimed = vec![false; tx.outputs.len()];
    for excess in &tx.additional_excesses {
        if !excess.verify() {
            return Err(TransactionError::InvalidExcessSignature);
        }
        let slot = (0..tx.outputs.len())
            .find(|&i| !claimed[i] && tx.outputs[i].apc.as_bytes().as_slice() == excess.message)
            .ok_or(TransactionError::UnclaimedExcess)?;
        claimed[slot] = true;
    }
    Ok(())
}

fn verify_burdens(tx: &Transaction) -> Result<(), TransactionError> {
    for input in &tx.inputs {
        if let Some(burden) = input.burden {
            let satisfied = tx
                .additional_excesses
                .iter()
                .any(|e| Excess::burden_hash(&e.pubkey) == burden);
            if !satisfied {
                return Err(TransactionError::UnsatisfiedBurden(input.index().to_string()));
            }
        }
    }
    Ok(())
}

fn points<F>(items: &[Output], f: F) -> Result<Vec<RistrettoPoint>, TransactionError>
where
    F: Fn(&Output) -> Result<RistrettoPoint, TransactionError>,
{
    items.iter().map(f).collect()
}

fn verify_balance(tx: &Transaction, params: &ConsensusParams) -> Result<(), TransactionError> {
    let inputs = points(&tx.inputs, Output::apc_point)?;
    let outputs = points(&tx.outputs, Output::apc_point)?;
    let addresses = points(&tx.outputs, Output::address_point)?;
    let excesses = tx
        .additional_excesses
        .iter()
        .map(|e| e.pubkey.to_point())
        .collect::<Result<Vec<_>, _>>()?;

    let mint = tx.coinbase().and_then(Output::transparent_value).unwrap_or(0);
    let fee = tx.fee(params)?;
    let fee_magnitude =
        u64::try_from(fee.unsigned_abs()).map_err(|_| TransactionError::FeeOverflow)?;

    let mut lhs = sum_points(&inputs) + sum_points(&addresses) + sum_points(&excesses);
    lhs += value_point(mint);
    let mut rhs = sum_points(&outputs);
    if fee >= 0 {
        rhs += value_point(fee_magnitude);
    } else {
        lhs += value_point(fee_magnitude);
    }

    if lhs == rhs {
        Ok(())
    } else {
        Err(TransactionError::Unbalanced)
    }
}
