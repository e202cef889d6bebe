use std::io::Read;

use mpfd_headers::{Commas, HeaderError, HeaderMap, ParsedHeaderValue};
use mpfd_wire::RingReader;
use mpfd_wire::WireError;
use mpfd_wire::line::read_line;

use crate::config::DecoderConfig;
use crate::error::DecodeError;

/// Headers of one part, with the two headers the decoder itself relies on
/// already tokenized.
#[derive(Clone, Debug, Default)]
pub(crate) struct PartHead {
  pub headers: HeaderMap,
  pub disposition: Option<ParsedHeaderValue>,
  pub content_type: Option<ParsedHeaderValue>,
}

/// Read one header block, up to and including its blank line.
///
/// ```text
///   Content-Disposition: form-data;\r\n     ← logical line starts
///     name="field1"\r\n                     ← continuation (leading SP/HT)
///   Content-Type: text/plain\r\n
///   \r\n                                    ← end of block
/// ```
///
/// Header bytes are read as UTF-8 (invalid sequences replaced), which
/// covers both plain ASCII and RFC 7578 UTF-8 filenames.
pub(crate) fn read_header_block<R: Read>(
  ring: &mut RingReader<R>,
  config: &DecoderConfig,
) -> Result<PartHead, DecodeError> {
  let mut headers = HeaderMap::new();
  let mut logical: Option<String> = None;
  let mut line = Vec::new();
  let mut count = 0usize;

  loop {
    read_line(ring, &mut line, config.max_header_line)?;
    if line.is_empty() {
      break;
    }
    let text = String::from_utf8_lossy(&line);

    if text.starts_with([' ', '\t']) {
      let Some(current) = logical.as_mut() else {
        return Err(HeaderError::MalformedLine { line: text.into_owned() }.into());
      };
      if current.len() + text.len() > config.max_header_line {
        return Err(WireError::LineTooLong { limit: config.max_header_line }.into());
      }
      current.push_str(&text);
      continue;
    }

    if let Some(done) = logical.replace(text.into_owned()) {
      add_header(&mut headers, &done)?;
    }
    count += 1;
    if count > config.max_headers {
      return Err(DecodeError::TooManyHeaders { limit: config.max_headers });
    }
  }
  if let Some(done) = logical {
    add_header(&mut headers, &done)?;
  }

  // Fatal here rather than on access: the decoder needs both to describe
  // the part.
  let disposition = headers
    .parse_all("content-disposition", Commas::Literal)?
    .into_iter()
    .next();
  let content_type = headers
    .parse_all("content-type", Commas::Literal)?
    .into_iter()
    .next();

  Ok(PartHead { headers, disposition, content_type })
}

fn add_header(headers: &mut HeaderMap, line: &str) -> Result<(), HeaderError> {
  let malformed = || HeaderError::MalformedLine { line: line.to_owned() };
  let (name, value) = line.split_once(':').ok_or_else(malformed)?;
  let name = name.trim_end_matches([' ', '\t']);
  if name.is_empty() || !name.bytes().all(is_token_byte) {
    return Err(malformed());
  }
  headers.add(name, value.trim());
  Ok(())
}

/// RFC 7230 `tchar`.
fn is_token_byte(b: u8) -> bool {
  b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}
