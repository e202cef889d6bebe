#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use mpfd_decoder::{DecoderConfig, PartDecoder};
use mpfd_encoder::FormEncoder;
use std::io::Read;

const MAX_NAME_CHARS: usize = 512;

#[derive(Debug, Arbitrary)]
enum FuzzPart {
    Field { name: String, value: Vec<u8> },
    File { name: String, filename: String, content: Vec<u8> },
}

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    boundary: String,
    parts: Vec<FuzzPart>,
    min_capacity: u16,
}

// Fuzz target: FormEncoder → PartDecoder roundtrip.
//
// Whatever the encoder accepts must decode to the same names, filenames
// and bytes, for any ring size.
fuzz_target!(|input: FuzzInput| {
    // Keep every Content-Disposition line under the default line limit.
    let too_long = |s: &String| s.chars().count() > MAX_NAME_CHARS;
    if input.parts.iter().any(|p| match p {
        FuzzPart::Field { name, .. } => too_long(name),
        FuzzPart::File { name, filename, .. } => too_long(name) || too_long(filename),
    }) {
        return;
    }

    let mut encoder = FormEncoder::new();
    encoder.with_boundary(&input.boundary);
    for part in &input.parts {
        match part {
            FuzzPart::Field { name, value } => {
                encoder.add_field_bytes(name, value);
            }
            FuzzPart::File { name, filename, content } => {
                encoder.add_file(name, filename, "application/octet-stream", content);
            }
        }
    }
    let Ok(body) = encoder.encode() else {
        return;
    };

    let config = DecoderConfig::default().min_capacity(usize::from(input.min_capacity));
    let mut decoder = PartDecoder::with_config(body.as_slice(), &input.boundary, config)
        .expect("encoded body opens");
    for expected in &input.parts {
        let mut part = decoder
            .next_part()
            .expect("encoded part decodes")
            .expect("part present");
        let mut data = Vec::new();
        part.read_to_end(&mut data).expect("encoded body reads");
        match expected {
            FuzzPart::Field { name, value } => {
                assert_eq!(part.name(), Some(name.as_str()));
                assert_eq!(&data, value);
            }
            FuzzPart::File { name, filename, content } => {
                assert_eq!(part.name(), Some(name.as_str()));
                assert_eq!(part.filename(), Some(filename.as_str()));
                assert_eq!(&data, content);
            }
        }
    }
    assert!(decoder.next_part().expect("close delimiter").is_none());
});
