#![no_main]

use libfuzzer_sys::fuzz_target;
use logmetrics_config::{clean_extended_regex, compile_extended};

fuzz_target!(|data: &[u8]| {
    if let Ok(raw) = std::str::from_utf8(data) {
        let clean = clean_extended_regex(raw);
        assert!(!clean.contains(' '));
        assert!(!clean.contains('#'));
        if let Ok(re) = compile_extended("fuzz", raw) {
            assert_eq!(re.as_str(), clean);
        }
    }
});
