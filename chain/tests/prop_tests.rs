use std::sync::Arc;

use proptest::prelude::*;

use glint_chain::HeaderChain;
use glint_ledger::{next_popow, ExpiringCache, Header, HeaderTemplate, MerkleRoots};
use glint_nullables::NullEnvironment;
use glint_store::Environment;
use glint_types::{ConsensusParams, NetworkId, Timestamp};
use glint_work::Blake2bOracle;

fn params() -> ConsensusParams {
    ConsensusParams::for_network(NetworkId::Dev)
}

fn genesis() -> Header {
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

fn extend(from: &Header, len: usize, salt: u8) -> Vec<Header> {
    let mut out: Vec<Header> = Vec::new();
    for _ in 0..len {
        let parent = out.last().unwrap_or(from).clone();
        let t = &parent.template;
        let mut votedata = [0; 8];
        votedata[0] = salt;
        out.push(Header::new(
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
        ));
    }
    out
}

/// Genesis, a main line of four and a three-block fork off its second block.
fn tree() -> Vec<Header> {
    let g = genesis();
    let main = extend(&g, 4, 0);
    let fork = extend(&main[1], 3, 1);
    std::iter::once(g).chain(main).chain(fork).collect()
}

proptest! {
    /// Arrival order never changes which headers connect or which tip wins.
    #[test]
    fn best_tip_is_independent_of_arrival_order(
        headers in Just(tree()).prop_shuffle()
    ) {
        let expected = tree().last().unwrap().hash();
        let env = NullEnvironment::new();
        let chain = HeaderChain::new(params(), Arc::new(Blake2bOracle), genesis().hash(), true);
        let mut txn = env.write_txn().unwrap();
        for header in &headers {
            chain.add_header(&mut txn, header.clone()).unwrap();
        }
        prop_assert_eq!(chain.best_tip(&txn).unwrap(), Some(expected));
        prop_assert_eq!(chain.find_best_tip(&txn).unwrap(), Some(expected));
        for header in &headers {
            let stored = chain.get(&txn, &header.hash()).unwrap().unwrap();
            prop_assert!(stored.is_valid_connected());
        }
    }

    /// The cache never holds more than its capacity.
    #[test]
    fn cache_respects_capacity(
        capacity in 1usize..16,
        keys in prop::collection::vec(0u32..64, 0..128),
    ) {
        let mut cache = ExpiringCache::new(3_600, capacity);
        for (i, key) in keys.into_iter().enumerate() {
            cache.insert(key, i, Timestamp::new(i as u64));
            prop_assert!(cache.len() <= capacity);
        }
    }
}
