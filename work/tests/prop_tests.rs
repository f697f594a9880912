use std::sync::atomic::AtomicBool;

use proptest::prelude::*;

use glint_work::{
    compact_to_target, target_to_compact, validate_pow, Blake2bOracle, NonceSearch, Work, U256,
};

proptest! {
    /// A nonce found by the search always passes validation.
    #[test]
    fn found_nonce_always_valid(template in prop::collection::vec(any::<u8>(), 0..64)) {
        let cancel = AtomicBool::new(false);
        let nonce = NonceSearch::with_batch_size(256)
            .search(&Blake2bOracle, &template, 0, 0x2000_ffff, &cancel)
            .unwrap();
        prop_assert!(validate_pow(&Blake2bOracle, &template, nonce, 0, 0x2000_ffff).is_ok());
    }

    /// Encoding then decoding never makes the target larger.
    #[test]
    fn compact_encoding_truncates_down(bytes in prop::array::uniform32(0u8..)) {
        let target = U256::from_big_endian(&bytes);
        prop_assume!(!target.is_zero());
        let decoded = compact_to_target(target_to_compact(target)).unwrap();
        prop_assert!(decoded <= target);
    }

    /// Compact encoding is canonical for decoded targets.
    #[test]
    fn compact_is_canonical(exponent in 4u32..=32, mantissa in 0x8000u32..0x7f_ffff) {
        let bits = (exponent << 24) | mantissa;
        let target = compact_to_target(bits).unwrap();
        prop_assert_eq!(target_to_compact(target), bits);
    }

    /// Lower targets always represent at least as much work.
    #[test]
    fn work_monotone_in_target(a in 0x0400_8000u32..0x1f00_ffff, b in 0x0400_8000u32..0x1f00_ffff) {
        let (Ok(ta), Ok(tb)) = (compact_to_target(a), compact_to_target(b)) else {
            return Ok(());
        };
        let (wa, wb) = (Work::from_compact(a).unwrap(), Work::from_compact(b).unwrap());
        if ta <= tb {
            prop_assert!(wa >= wb);
        }
    }
}
