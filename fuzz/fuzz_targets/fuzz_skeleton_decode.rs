#![no_main]

use libfuzzer_sys::fuzz_target;

use glint_ledger::Block;
use glint_transactions::TransactionSkeleton;

fuzz_target!(|data: &[u8]| {
    // Skeletons travel inside blocks and on their own; neither decoding
    // path may panic on malformed input.
    if let Ok(skeleton) = TransactionSkeleton::from_bytes(data) {
        let _ = skeleton.id();
        let _ = skeleton.size();
        // Resolving against an empty store reports everything missing.
        let wanted = skeleton.input_indexes.len() + skeleton.output_indexes.len();
        match skeleton.materialize(|_| None) {
            Ok(tx) => assert_eq!(wanted, 0, "materialized {} outputs from nothing", tx.outputs.len()),
            Err(missing) => assert_eq!(missing.len(), wanted),
        }
    }

    if let Ok(block) = Block::from_bytes(data) {
        let _ = block.hash();
        let _ = block.header.is_self_consistent();
    }
});
