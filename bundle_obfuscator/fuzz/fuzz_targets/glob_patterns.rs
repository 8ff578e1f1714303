#![no_main]

use bundle_obfuscator::patterns::{expand_braces, PatternSet};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let input = String::from_utf8_lossy(data);
    if input.is_empty() || input.len() > 4096 {
        return;
    }

    // First line is the pattern, the rest are paths to match against it
    let mut lines = input.lines();
    let pattern = lines.next().unwrap_or_default();

    if let Some(expanded) = expand_braces(pattern) {
        assert!(!expanded.is_empty());
    }

    if let Ok(set) = PatternSet::new([pattern]) {
        for path in lines {
            let _ = set.is_match(path);
        }
    }
});
