#![no_main]

use libfuzzer_sys::fuzz_target;
use lucene3x::utils::{compare_str_as_utf16, compare_utf8_as_utf16};

fuzz_target!(|pair: (String, String)| {
    // The byte-level comparison must agree with comparing UTF-16 code units
    let (a, b) = pair;
    assert_eq!(
        compare_utf8_as_utf16(a.as_bytes(), b.as_bytes()),
        compare_str_as_utf16(&a, &b)
    );
});
