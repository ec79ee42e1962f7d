#![no_main]
use libfuzzer_sys::fuzz_target;

use mokman_core::siglist;

fuzz_target!(|data: &[u8]| {
    // Totality: the codec must terminate without panicking on anything,
    // and never yield a mis-sized hash payload.
    let mut count = 0usize;
    for entry in siglist::iterate(data) {
        if entry.kind == siglist::SignatureKind::Sha256 {
            assert_eq!(entry.data.len(), 32);
        }
        count += 1;
    }
    assert!(count <= data.len() / 17);
});
