#![no_main]

use std::io::Read;

use libfuzzer_sys::fuzz_target;
use mpfd_decoder::{DecoderConfig, PartDecoder};

// Fuzz target: PartDecoder over arbitrary bytes.
//
// Input format:
//   byte 0: boundary length (1..=16)
//   bytes 1..=len: boundary (CR/LF replaced)
//   rest: body
//
// Catches bugs in:
// - Ring buffer wrap-around and cursor arithmetic
// - Boundary classification at every window position
// - Header block reading on garbage
fuzz_target!(|data: &[u8]| {
    let Some((&len, rest)) = data.split_first() else {
        return;
    };
    let len = usize::from(len % 16) + 1;
    if rest.len() < len {
        return;
    }
    let (boundary, body) = rest.split_at(len);
    let boundary: String = boundary
        .iter()
        .map(|&b| if b == b'\r' || b == b'\n' { 'x' } else { char::from(b) })
        .collect();

    let config = DecoderConfig::default().min_capacity(1);
    let Ok(mut decoder) = PartDecoder::with_config(body, &boundary, config) else {
        return;
    };
    let mut sink = Vec::new();
    loop {
        match decoder.next_part() {
            Ok(Some(mut part)) => {
                let _ = part.name();
                let _ = part.charset();
                sink.clear();
                if part.read_to_end(&mut sink).is_err() {
                    break;
                }
                assert!(part.is_finished());
            }
            Ok(None) | Err(_) => break,
        }
    }
    assert!(decoder.position() <= body.len() as u64);
});
