//! Fuzz target for annotation tree decoding.
//!
//! Feeds arbitrary byte sequences to the XML tree decoder, checking for
//! panics, crashes, or hangs.

#![no_main]

use libfuzzer_sys::fuzz_target;
use vocset::tree::fuzz_decode;

fuzz_target!(|data: &[u8]| {
    // Cap input size to avoid excessive memory usage.
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = fuzz_decode(data);
});
