//! Shared fixtures for the integration tests and benches.
//!
//! The helpers here decode a body into owned parts so tests can compare
//! whole decodes, and provide a reader that splits its input into awkward
//! chunk sizes to push delimiters across ring buffer refills.

use std::io::{self, Read};

use mpfd_decoder::encoding_rs::{self, Encoding};
use mpfd_decoder::{DecodeError, DecoderConfig, PartDecoder};
use mpfd_encoder::FormEncoder;
use mpfd_headers::HeaderMap;

/// The `XYZ` example body: one text field and one file.
pub const SCENARIO_BODY: &[u8] = b"--XYZ\r\n\
Content-Disposition: form-data; name=\"field1\"\r\n\
\r\n\
hello\r\n\
--XYZ\r\n\
Content-Disposition: form-data; name=\"file\"; filename=\"report.txt\"\r\n\
Content-Type: text/plain\r\n\
\r\n\
data\r\n\
--XYZ--\r\n";

/// One decoded part with everything it owned copied out of the decoder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnedPart {
    pub index: usize,
    pub name: Option<String>,
    pub filename: Option<String>,
    pub charset: &'static str,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// Decode every part of `source`, reading each body with `Read::read_to_end`.
///
/// # Errors
///
/// The first decode error, unwrapped from `io::Error` where needed.
pub fn decode_all<R: Read>(
    source: R,
    boundary: &str,
    config: DecoderConfig,
) -> Result<Vec<OwnedPart>, DecodeError> {
    let mut decoder = PartDecoder::with_config(source, boundary, config)?;
    let mut parts = Vec::new();
    while let Some(mut part) = decoder.next_part()? {
        let mut body = Vec::new();
        part.read_to_end(&mut body).map_err(DecodeError::from_io)?;
        parts.push(OwnedPart {
            index: part.index(),
            name: part.name().map(str::to_owned),
            filename: part.filename().map(str::to_owned),
            charset: part.charset().name(),
            headers: part.headers().clone(),
            body,
        });
    }
    Ok(parts)
}

/// Render a decoded part listing as stable text for snapshot tests.
///
/// Bodies are decoded with each part's charset.
pub fn render(parts: &[OwnedPart]) -> String {
    use std::fmt::Write as _;

    let mut out = String::new();
    for part in parts {
        let _ = writeln!(
            out,
            "#{} name={:?} filename={:?} charset={}",
            part.index, part.name, part.filename, part.charset
        );
        for (name, values) in part.headers.iter() {
            for value in values {
                let _ = writeln!(out, "  {name}: {value}");
            }
        }
        let charset = Encoding::for_label(part.charset.as_bytes()).unwrap_or(encoding_rs::UTF_8);
        let (text, _) = charset.decode_without_bom_handling(&part.body);
        let _ = writeln!(out, "  body: {text:?}");
    }
    out
}

/// A form with `count` fields whose bodies are `size` bytes of filler text,
/// encoded with `boundary`.
///
/// # Panics
///
/// When the encoder rejects the form (only possible for a bad boundary).
pub fn filler_form(boundary: &str, count: usize, size: usize) -> Vec<u8> {
    let filler: Vec<u8> = b"lorem ipsum\r\n-- dolor\rsit\namet "
        .iter()
        .copied()
        .cycle()
        .take(size)
        .collect();
    let mut encoder = FormEncoder::new();
    encoder.with_boundary(boundary);
    for i in 0..count {
        encoder.add_field_bytes(&format!("field{i}"), &filler);
    }
    encoder.encode().expect("filler form encodes")
}

/// Reader that hands out its input in a repeating pattern of chunk sizes.
///
/// A zero in the pattern is skipped; an empty pattern reads everything at
/// once.
pub struct ChunkedReader<'a> {
    data: &'a [u8],
    sizes: Vec<usize>,
    next: usize,
}

impl<'a> ChunkedReader<'a> {
    pub fn new(data: &'a [u8], sizes: &[usize]) -> Self {
        Self {
            data,
            sizes: sizes.iter().copied().filter(|&n| n > 0).collect(),
            next: 0,
        }
    }
}

impl Read for ChunkedReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let limit = if self.sizes.is_empty() {
            self.data.len()
        } else {
            let size = self.sizes[self.next % self.sizes.len()];
            self.next += 1;
            size
        };
        let n = limit.min(buf.len()).min(self.data.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}
