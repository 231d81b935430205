#![no_main]

use libfuzzer_sys::fuzz_target;
use logmetrics_config::Config;
use logmetrics_config::group::MAX_GOROUTINES;

fuzz_target!(|data: &[u8]| {
    // YAML 파서는 &str을 받으므로 UTF-8 변환 필요
    if let Ok(yaml_str) = std::str::from_utf8(data) {
        if let Ok(config) = Config::parse(yaml_str, "fuzz-input.yml") {
            for group in config.log_groups.values() {
                assert_eq!(group.tail_data.len(), group.goroutines);
                assert!((1..=MAX_GOROUTINES).contains(&group.goroutines));
            }
        }
    }
});
