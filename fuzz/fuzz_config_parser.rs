//! Fuzz target for the TOML configuration parser.
//!
//! Run with: cargo +nightly fuzz run fuzz_config_parser
//!
//! Feeds arbitrary text to `AppConfig::parse()`; a parsed config must also
//! answer `source_mode()` and build its tag filter without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(config) = proofdict_config::AppConfig::parse(s) {
        let _ = config.source_mode();
        let _ = config.build_tag_filter();
        if let Some(locator) = &config.dictionary.dict_url {
            let _ = locator.json_url();
            let _ = locator.rule_url(Some("id"));
        }
    }
});
