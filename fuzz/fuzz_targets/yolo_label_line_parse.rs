//! Fuzz target for YOLO label line parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use labelops::yolo::fuzz_parse_label_line;

fuzz_target!(|data: &[u8]| {
    let Ok(line) = std::str::from_utf8(data) else {
        return;
    };

    if let Some(formatted) = fuzz_parse_label_line(line) {
        // A formatted row must parse again.
        assert!(fuzz_parse_label_line(&formatted).is_some());
    }
});
