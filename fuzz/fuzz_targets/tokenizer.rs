#![no_main]

use libfuzzer_sys::fuzz_target;
use mpfd_headers::tokenizer::{parse_all, parse_first};
use mpfd_headers::Commas;

// Fuzz target: header value tokenizer.
//
// Catches bugs in:
// - Quote / escape / comment state handling
// - Offset arithmetic when splitting on commas (must always advance)
// - Trimming around protected (quoted) ranges on char boundaries
fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };
    for commas in [Commas::Separate, Commas::Literal] {
        if let Ok((value, next)) = parse_first("x-fuzz", raw, commas) {
            assert!(next <= raw.len());
            assert!(raw.is_char_boundary(next));
            for (key, _) in value.iter() {
                assert_eq!(key, key.to_lowercase());
            }
        }
        if let Ok(values) = parse_all("x-fuzz", raw, commas) {
            assert!(values.iter().all(|v| !v.is_empty()));
            if commas == Commas::Literal {
                assert!(values.len() <= 1);
            }
        }
    }
});
