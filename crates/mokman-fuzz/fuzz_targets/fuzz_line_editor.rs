#![no_main]
use libfuzzer_sys::fuzz_target;

use mokman_core::line;
use mokman_efi::sim::SimConsole;

fuzz_target!(|data: &[u8]| {
    // Arbitrary keystroke soup must never panic or overrun the limit.
    let mut con = SimConsole::new();
    for pair in data.chunks(2) {
        let unit = if pair.len() == 2 {
            u16::from_le_bytes([pair[0], pair[1]])
        } else {
            u16::from(pair[0])
        };
        con.script_keys([mokman_efi::Key {
            scan: mokman_efi::ScanCode::Null,
            unicode: unit,
        }]);
    }
    // The exhausted-script fallback (Enter) terminates the read.
    let buf = line::read_line(&mut con, 16, false);
    assert!(buf.len() <= 16);
    let _ = con.output();
});
