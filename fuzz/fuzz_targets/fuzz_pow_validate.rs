#![no_main]

use libfuzzer_sys::fuzz_target;

use glint_work::{compact_to_target, validate_pow, Blake2bOracle};

fuzz_target!(|data: &[u8]| {
    // Arbitrary compact targets, nonces and templates must never panic.
    // Layout: 4 bytes bits, 8 bytes nonce, 8 bytes height, rest template.
    if data.len() < 20 {
        return;
    }
    let bits = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    let nonce = u64::from_le_bytes([
        data[4], data[5], data[6], data[7], data[8], data[9], data[10], data[11],
    ]);
    let height = u64::from_le_bytes([
        data[12], data[13], data[14], data[15], data[16], data[17], data[18], data[19],
    ]);
    let _ = compact_to_target(bits);
    let _ = validate_pow(&Blake2bOracle, &data[20..], nonce, height, bits);
});
