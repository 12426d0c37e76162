//! Fuzz target for GitHub issue payload parsing.
//!
//! This fuzzer feeds arbitrary byte sequences to the payload reader,
//! checking for panics, crashes, or hangs.

#![no_main]

use libfuzzer_sys::fuzz_target;
use issue2hugo::ir::io_event_json::from_event_slice;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = from_event_slice(data);
});
