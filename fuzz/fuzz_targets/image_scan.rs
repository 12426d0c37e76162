//! Fuzz target for markdown image scanning and code region detection.

#![no_main]

use libfuzzer_sys::fuzz_target;
use issue2hugo::images::fuzz_resolve_body;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }

    let Ok(body) = std::str::from_utf8(data) else {
        return;
    };

    let _ = fuzz_resolve_body(body);
});
