#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use mpfd_headers::{canonical_name, Commas, HeaderMap};

#[derive(Debug, Arbitrary)]
enum Op {
    Add(String, String),
    Set(String, String),
    Remove(String),
    ParseFirst(String),
    ParseAll(String),
}

// Fuzz target: ordered header map operations.
//
// Checks that names are stored canonically, lookups are case-insensitive,
// and the tokenizer entry points never panic on stored values.
fuzz_target!(|ops: Vec<Op>| {
    let mut map = HeaderMap::new();
    for op in ops {
        match op {
            Op::Add(name, value) => {
                map.add(&name, value.clone());
                let upper = name.to_uppercase();
                if upper.len() == name.len() && name.is_ascii() {
                    assert!(map.get(&upper).unwrap().contains(&value));
                }
            }
            Op::Set(name, value) => {
                map.set(&name, value.clone());
                assert_eq!(map.get(&name).unwrap(), [value]);
            }
            Op::Remove(name) => {
                map.remove(&name);
                assert!(!map.contains_key(&name));
            }
            Op::ParseFirst(name) => {
                let _ = map.parse_first(&name, Commas::Separate);
            }
            Op::ParseAll(name) => {
                let _ = map.parse_all(&name, Commas::Literal);
            }
        }
    }
    for name in map.names() {
        assert_eq!(name, canonical_name(name));
    }
});
