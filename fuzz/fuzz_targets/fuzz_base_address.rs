#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    if let Ok(url) = heading_config::parse_base_address(data) {
        assert!(url.path().ends_with('/'));
        assert!(matches!(url.scheme(), "http" | "https"));
        assert!(url.query().is_none());
    }
});
