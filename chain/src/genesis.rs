//! The fixed first block of every network.
//!
//! Everything is derived from a per-network seed, so every node builds the
//! same genesis block without shipping it as data.

use std::sync::atomic::AtomicBool;

use glint_crypto::keypair_from_seed;
use glint_ledger::{Block, Header, HeaderTemplate, MerkleRoots};
use glint_mmr::{HashSum, PointHashSum, PointSum, Summator};
use glint_transactions::{coinbase_from_opening, SpendableOutput, Transaction};
use glint_types::ConsensusParams;
use glint_work::{NonceSearch, PowOracle};

use crate::ChainError;

fn seed(params: &ConsensusParams, purpose: &str) -> Vec<u8> {
    format!("glint/genesis/{}/{purpose}", params.network.as_str()).into_bytes()
}

/// Root of an accumulator holding `leaves` in order. Genesis trees hold at
/// most two leaves, so the root is the leaf itself or the sum of both.
fn small_root(summator: &impl Summator, leaves: &[Vec<u8>]) -> Result<Vec<u8>, ChainError> {
    let values = leaves
        .iter()
        .map(|index| summator.leaf(index))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ChainError::Violation(format!("genesis accumulator: {e}")))?;
    match values.as_slice() {
        [] => Ok(summator.empty_root()),
        [only] => Ok(only.clone()),
        [left, right] => summator
            .sum(left, right)
            .map_err(|e| ChainError::Violation(format!("genesis accumulator: {e}"))),
        _ => Err(ChainError::Violation(
            "genesis transaction is too large".into(),
        )),
    }
}

fn genesis_roots(tx: &Transaction) -> Result<MerkleRoots, ChainError> {
    let outputs: Vec<Vec<u8>> = tx.outputs.iter().map(|o| o.index().to_bytes().to_vec()).collect();
    let excesses: Vec<Vec<u8>> = tx
        .outputs
        .iter()
        .map(|o| o.address.index().to_bytes().to_vec())
        .chain(tx.additional_excesses.iter().map(|e| e.index().to_bytes().to_vec()))
        .collect();
    Ok(MerkleRoots::from_roots(
        &small_root(&PointSum, &outputs)?,
        &small_root(&HashSum, &outputs)?,
        &small_root(&PointHashSum, &excesses)?,
    )?)
}

/// Build and mine the genesis block of `params.network`.
pub fn build_genesis(
    params: &ConsensusParams,
    oracle: &(impl PowOracle + ?Sized),
) -> Result<Block, ChainError> {
    let tx = genesis_transaction(params)?;
    let supply = params.subsidy(0);
    let template = HeaderTemplate {
        version: params.header_version,
        height: 0,
        supply,
        roots: genesis_roots(&tx)?,
        popow: Vec::new(),
        votedata: [0; 8],
        timestamp: params.genesis_timestamp,
        bits: params.initial_target,
    };
    let nonce = NonceSearch::default().search(
        oracle,
        &template.to_bytes(),
        0,
        template.bits,
        &AtomicBool::new(false),
    )?;
    Ok(Block::new(Header::new(template, nonce), tx.skeleton()))
}

/// The genesis coinbase in full, for seeding the provisional pool.
pub fn genesis_transaction(params: &ConsensusParams) -> Result<Transaction, ChainError> {
    Ok(genesis_coin(params)?.0)
}

/// The genesis coinbase together with the secrets that spend it. The seed
/// is public, so on anything but a development network the coin is
/// effectively burnt.
pub fn genesis_coin(
    params: &ConsensusParams,
) -> Result<(Transaction, SpendableOutput), ChainError> {
    let address = keypair_from_seed(&seed(params, "address")).secret;
    let blinding = keypair_from_seed(&seed(params, "blinding")).secret;
    Ok(coinbase_from_opening(
        params,
        params.subsidy(0),
        0,
        &address,
        blinding,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_ledger::Ledger;
    use glint_nullables::NullEnvironment;
    use glint_store::Environment;
    use glint_transactions::{non_context_verify, VerifyMode};
    use glint_types::{Hash256, NetworkId};
    use glint_work::{validate_pow, Blake2bOracle};

    #[test]
    fn genesis_is_deterministic_and_mined() {
        let params = ConsensusParams::for_network(NetworkId::Dev);
        let a = build_genesis(&params, &Blake2bOracle).unwrap();
        let b = build_genesis(&params, &Blake2bOracle).unwrap();
        assert_eq!(a, b);
        assert!(a.header.is_self_consistent());
        let t = &a.header.template;
        assert!(validate_pow(&Blake2bOracle, &t.to_bytes(), a.header.nonce, 0, t.bits).is_ok());
        assert!(t.roots.balances_with(t.supply));
    }

    #[test]
    fn networks_get_distinct_genesis_blocks() {
        let dev = build_genesis(&ConsensusParams::for_network(NetworkId::Dev), &Blake2bOracle).unwrap();
        let test =
            build_genesis(&ConsensusParams::for_network(NetworkId::Test), &Blake2bOracle).unwrap();
        assert_ne!(dev.hash(), test.hash());
    }

    #[test]
    fn header_roots_match_the_ledger() {
        let params = ConsensusParams::for_network(NetworkId::Dev);
        let block = build_genesis(&params, &Blake2bOracle).unwrap();
        let tx = genesis_transaction(&params).unwrap();
        assert_eq!(tx.skeleton(), block.skeleton);
        non_context_verify(&tx, &params, VerifyMode::Block { height: 0 }).unwrap();

        let env = NullEnvironment::new();
        let mut ledger = Ledger::new();
        let mut txn = env.write_txn().unwrap();
        ledger.apply_tx(&mut txn, &tx, &Hash256::new([1; 32])).unwrap();
        assert_eq!(ledger.roots(&txn).unwrap(), block.header.template.roots);
    }
}
