use std::fmt;
use std::io::{self, Read};

use encoding_rs::Encoding;
use mpfd_headers::HeaderMap;

use crate::decoder::{PartDecoder, State};
use crate::error::DecodeError;

/// One body part, readable as a stream.
///
/// A `Part` borrows its [`PartDecoder`] mutably, so only one part can be
/// open at a time. Reading stops at the part's delimiter; the first `Ok(0)`
/// marks the part finished and lets the decoder move on. Dropping a part
/// before that leaves the decoder in the middle of the body, and the next
/// [`PartDecoder::next_part`] call fails with
/// [`DecodeError::Sequencing`]. Call [`close`](Self::close) to skip the
/// rest of a part.
pub struct Part<'a, R> {
  decoder: &'a mut PartDecoder<R>,
  index: usize,
}

impl<'a, R: Read> Part<'a, R> {
  pub(crate) fn new(decoder: &'a mut PartDecoder<R>, index: usize) -> Self {
    Self { decoder, index }
  }

  /// Zero-based position of this part in the body.
  pub fn index(&self) -> usize {
    self.index
  }

  pub fn headers(&self) -> &HeaderMap {
    &self.decoder.head.headers
  }

  /// The `name` parameter of `Content-Disposition`.
  pub fn name(&self) -> Option<&str> {
    self.decoder.head.disposition.as_ref()?.get("name")
  }

  /// The `filename` parameter of `Content-Disposition`.
  pub fn filename(&self) -> Option<&str> {
    self.decoder.head.disposition.as_ref()?.get("filename")
  }

  pub fn is_file(&self) -> bool {
    self.filename().is_some()
  }

  /// The raw `Content-Type` header value.
  pub fn content_type(&self) -> Option<&str> {
    self.headers().get_first("content-type")
  }

  /// The media type of `Content-Type`, without parameters.
  pub fn media_type(&self) -> Option<&str> {
    self.decoder.head.content_type.as_ref()?.primary("content-type")
  }

  /// Charset of the part's text.
  ///
  /// An explicit `charset` parameter wins; unknown labels fall back to
  /// UTF-8. Without one, `text/plain` parts use the decoder's default
  /// charset and everything else is UTF-8.
  pub fn charset(&self) -> &'static Encoding {
    let Some(content_type) = self.decoder.head.content_type.as_ref() else {
      return encoding_rs::UTF_8;
    };
    if let Some(label) = content_type.get("charset") {
      return Encoding::for_label(label.trim().as_bytes()).unwrap_or(encoding_rs::UTF_8);
    }
    match content_type.primary("content-type") {
      Some(media) if media.eq_ignore_ascii_case("text/plain") => self.decoder.default_charset(),
      _ => encoding_rs::UTF_8,
    }
  }

  /// Whether the body has been read up to its delimiter.
  pub fn is_finished(&self) -> bool {
    self.decoder.state != State::StreamingBody
  }

  /// Read body bytes into `buf`, returning `Ok(0)` at the part's end.
  ///
  /// This is the typed counterpart of [`Read::read`].
  ///
  /// # Errors
  ///
  /// Truncation and I/O errors; the decoder is finished afterwards.
  pub fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, DecodeError> {
    if buf.is_empty() || self.is_finished() {
      return Ok(0);
    }
    let result = self.decoder.read_body(buf);
    if result.is_err() {
      self.decoder.fail();
    }
    result
  }

  /// Read the rest of the body and decode it with [`charset`](Self::charset).
  ///
  /// Malformed sequences are replaced with U+FFFD.
  ///
  /// # Errors
  ///
  /// See [`read_chunk`](Self::read_chunk).
  pub fn read_to_text(&mut self) -> Result<String, DecodeError> {
    let mut bytes = Vec::new();
    self.read_to_end(&mut bytes).map_err(DecodeError::from_io)?;
    let (text, _) = self.charset().decode_without_bom_handling(&bytes);
    Ok(text.into_owned())
  }

  /// Skip whatever is left of the body. Safe to call more than once.
  ///
  /// # Errors
  ///
  /// See [`read_chunk`](Self::read_chunk).
  pub fn close(&mut self) -> Result<(), DecodeError> {
    let mut scratch = [0u8; 1024];
    while self.read_chunk(&mut scratch)? > 0 {}
    Ok(())
  }
}

impl<R: Read> Read for Part<'_, R> {
  fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
    self.read_chunk(buf).map_err(io::Error::from)
  }
}

impl<R: Read> fmt::Debug for Part<'_, R> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Part")
      .field("index", &self.index)
      .field("name", &self.name())
      .field("filename", &self.filename())
      .field("content_type", &self.content_type())
      .field("finished", &self.is_finished())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::DecoderConfig;

  fn single(headers: &str, body: &str) -> Vec<u8> {
    format!("--B\r\n{headers}\r\n\r\n{body}\r\n--B--\r\n").into_bytes()
  }

  #[test]
  fn accessors_read_disposition_and_type() {
    let raw = single(
      "Content-Disposition: form-data; name=\"up\"; filename=\"a b.txt\"\r\nContent-Type: text/csv; charset=utf-8",
      "x,y",
    );
    let mut decoder = PartDecoder::new(&raw[..], "B").unwrap();
    let part = decoder.next_part().unwrap().unwrap();
    assert_eq!(part.index(), 0);
    assert_eq!(part.name(), Some("up"));
    assert_eq!(part.filename(), Some("a b.txt"));
    assert!(part.is_file());
    assert_eq!(part.content_type(), Some("text/csv; charset=utf-8"));
    assert_eq!(part.media_type(), Some("text/csv"));
    assert!(!part.is_finished());
  }

  #[test]
  fn explicit_charset_wins() {
    let raw = single(
      "Content-Disposition: form-data; name=\"t\"\r\nContent-Type: text/plain; charset=ISO-8859-1",
      "caf\u{e9}",
    );
    let mut decoder = PartDecoder::new(&raw[..], "B").unwrap();
    let part = decoder.next_part().unwrap().unwrap();
    assert_eq!(part.charset(), encoding_rs::WINDOWS_1252);
  }

  #[test]
  fn unknown_charset_falls_back_to_utf8() {
    let raw = single(
      "Content-Disposition: form-data; name=\"t\"\r\nContent-Type: text/plain; charset=no-such-thing",
      "x",
    );
    let mut decoder = PartDecoder::new(&raw[..], "B").unwrap();
    assert_eq!(decoder.next_part().unwrap().unwrap().charset(), encoding_rs::UTF_8);
  }

  #[test]
  fn default_charset_only_applies_to_text_plain() {
    let plain = single("Content-Disposition: form-data; name=\"t\"\r\nContent-Type: text/plain", "x");
    let config = DecoderConfig::default().default_charset(encoding_rs::SHIFT_JIS);
    let mut decoder = PartDecoder::with_config(&plain[..], "B", config.clone()).unwrap();
    assert_eq!(decoder.next_part().unwrap().unwrap().charset(), encoding_rs::SHIFT_JIS);

    let html = single("Content-Disposition: form-data; name=\"t\"\r\nContent-Type: text/html", "x");
    let mut decoder = PartDecoder::with_config(&html[..], "B", config.clone()).unwrap();
    assert_eq!(decoder.next_part().unwrap().unwrap().charset(), encoding_rs::UTF_8);

    let untyped = single("Content-Disposition: form-data; name=\"t\"", "x");
    let mut decoder = PartDecoder::with_config(&untyped[..], "B", config).unwrap();
    assert_eq!(decoder.next_part().unwrap().unwrap().charset(), encoding_rs::UTF_8);
  }

  #[test]
  fn read_to_text_decodes_with_charset() {
    let mut raw = b"--B\r\nContent-Disposition: form-data; name=\"t\"\r\nContent-Type: text/plain; charset=windows-1252\r\n\r\ncaf".to_vec();
    raw.push(0xE9);
    raw.extend_from_slice(b"\r\n--B--\r\n");
    let mut decoder = PartDecoder::new(&raw[..], "B").unwrap();
    let mut part = decoder.next_part().unwrap().unwrap();
    assert_eq!(part.read_to_text().unwrap(), "café");
    assert!(part.is_finished());
  }

  #[test]
  fn read_after_end_keeps_returning_zero() {
    let raw = single("Content-Disposition: form-data; name=\"t\"", "abc");
    let mut decoder = PartDecoder::new(&raw[..], "B").unwrap();
    let mut part = decoder.next_part().unwrap().unwrap();
    let mut buf = [0u8; 16];
    assert_eq!(part.read(&mut buf).unwrap(), 3);
    assert_eq!(part.read(&mut buf).unwrap(), 0);
    assert_eq!(part.read(&mut buf).unwrap(), 0);
    assert_eq!(part.read(&mut []).unwrap(), 0);
  }

  #[test]
  fn io_errors_carry_decode_errors() {
    let raw = b"--B\r\nContent-Disposition: form-data; name=\"t\"\r\n\r\nnever ends";
    let mut decoder = PartDecoder::new(&raw[..], "B").unwrap();
    let mut part = decoder.next_part().unwrap().unwrap();
    let mut sink = Vec::new();
    let err = part.read_to_end(&mut sink).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    assert!(matches!(
      DecodeError::from_io(err),
      DecodeError::Wire(mpfd_wire::WireError::TruncatedBody { .. })
    ));
  }
}
