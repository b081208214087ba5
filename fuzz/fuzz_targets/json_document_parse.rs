//! Fuzz target for per-image JSON annotation documents.
//!
//! Raw bytes go through the same decoder chain as files on disk, so legacy
//! Korean encodings are exercised too.

#![no_main]

use libfuzzer_sys::fuzz_target;
use labelops::convert::schema::fuzz_parse_document;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = fuzz_parse_document(data);
});
