#![no_main]

use logparser::extract::{parse_error, parse_hitch, parse_memory};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);

    if let Ok(record) = parse_hitch("fuzz.log", 1, &text) {
        assert!(!record.thread.is_empty());
        assert!(record.duration_ms.is_finite() && record.duration_ms >= 0.0);
    }

    if let Ok(record) = parse_memory("fuzz.log", 1, &text) {
        assert!(record.footprint_mib.is_finite() && record.footprint_mib >= 0.0);
        assert!(record.run_time_secs.is_finite() && record.run_time_secs >= 0.0);
    }

    if let Ok(record) = parse_error("fuzz.log", 1, &text, "ERROR") {
        assert!(record.message.starts_with("ERROR"));
        assert!(!record.error_type.is_empty());
    }
});
