#![no_main]

use libfuzzer_sys::fuzz_target;

use glint_ledger::Header;

fuzz_target!(|data: &[u8]| {
    // Headers arrive from peers as raw bytes. Decoding and the cheap
    // structural checks must never panic.
    let Ok(header) = Header::from_bytes(data) else {
        return;
    };
    let _ = header.hash();
    let _ = header.prev();
    let _ = header.work();
    let _ = header.is_self_consistent();

    let reencoded = header.to_bytes();
    let again = Header::from_bytes(&reencoded).expect("re-encoded header must decode");
    assert_eq!(again, header);
});
