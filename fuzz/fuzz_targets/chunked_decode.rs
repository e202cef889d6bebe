#![no_main]

use std::io::{self, Read};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use mpfd_decoder::{DecoderConfig, PartDecoder};

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    body: Vec<u8>,
    chunks: Vec<u8>,
}

struct Chunked<'a> {
    data: &'a [u8],
    chunks: &'a [u8],
    next: usize,
}

impl Read for Chunked<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let size = match self.chunks.get(self.next % self.chunks.len().max(1)) {
            Some(&n) => usize::from(n % 8).max(1),
            None => self.data.len(),
        };
        self.next += 1;
        let n = size.min(buf.len()).min(self.data.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

type Outcome = (Vec<(Vec<(String, Vec<String>)>, Vec<u8>)>, bool);

fn decode<R: Read>(source: R, config: DecoderConfig) -> Outcome {
    let Ok(mut decoder) = PartDecoder::with_config(source, "XYZ", config) else {
        return (Vec::new(), false);
    };
    let mut parts = Vec::new();
    loop {
        match decoder.next_part() {
            Ok(Some(mut part)) => {
                let headers = part
                    .headers()
                    .iter()
                    .map(|(k, v)| (k.to_owned(), v.to_vec()))
                    .collect();
                let mut body = Vec::new();
                if part.read_to_end(&mut body).is_err() {
                    return (parts, false);
                }
                parts.push((headers, body));
            }
            Ok(None) => return (parts, true),
            Err(_) => return (parts, false),
        }
    }
}

// Fuzz target: chunking invariance.
//
// With a 16 byte ring, the same body decoded from one read and from
// arbitrary 1..=7 byte chunks must yield the same parts and the same
// success.
fuzz_target!(|input: FuzzInput| {
    let whole = decode(input.body.as_slice(), DecoderConfig::default().min_capacity(16));
    let chunked = decode(
        Chunked {
            data: &input.body,
            chunks: &input.chunks,
            next: 0,
        },
        DecoderConfig::default().min_capacity(16),
    );
    assert_eq!(whole, chunked);
});
