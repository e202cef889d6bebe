use std::io::Read;

use encoding_rs::Encoding;
use mpfd_headers::HeaderMap;
use mpfd_wire::ring::{RingReader, capacity_for};
use mpfd_wire::{BoundaryKind, BoundaryMatch, BoundaryScanner, ScanOutcome};

use crate::config::DecoderConfig;
use crate::error::DecodeError;
use crate::header_block::{PartHead, read_header_block};
use crate::part::Part;

/// Where the decoder stands in the body.
///
/// ```text
///   AwaitingHeaders ──next_part──▶ StreamingBody
///         ▲                             │
///         └─── continuing delimiter ────┤
///                                       │ close delimiter
///                      Done ◀───────────┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum State {
    /// The next header block starts at `resume_at` (or at the read
    /// position when `None`).
    AwaitingHeaders { resume_at: Option<u64> },
    /// A part body is open and has not reached its delimiter yet.
    StreamingBody,
    /// The close delimiter was consumed, or decoding failed.
    Done,
}

/// Streaming decoder for one `multipart/form-data` body.
///
/// Parts are produced one at a time by [`next_part`](Self::next_part). Each
/// [`Part`] mutably borrows the decoder and reads its body straight out of
/// the decoder's ring buffer, so memory use is bounded by the ring capacity
/// regardless of part sizes.
///
/// # Example
///
/// ```
/// use std::io::Read;
/// use mpfd_decoder::PartDecoder;
///
/// let body = b"--XYZ\r\n\
///     Content-Disposition: form-data; name=\"field1\"\r\n\
///     \r\n\
///     hello\r\n\
///     --XYZ--\r\n";
/// let mut decoder = PartDecoder::new(&body[..], "XYZ")?;
/// while let Some(mut part) = decoder.next_part()? {
///     let mut value = String::new();
///     part.read_to_string(&mut value)?;
///     assert_eq!(part.name(), Some("field1"));
///     assert_eq!(value, "hello");
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct PartDecoder<R> {
    pub(crate) ring: RingReader<R>,
    pub(crate) scanner: BoundaryScanner,
    pub(crate) state: State,
    pub(crate) head: PartHead,
    current: Option<usize>,
    parts_seen: usize,
    config: DecoderConfig,
}

impl<R: Read> PartDecoder<R> {
    /// Open a body delimited by `boundary` with the default configuration.
    ///
    /// # Errors
    ///
    /// See [`with_config`](Self::with_config).
    pub fn new(source: R, boundary: &str) -> Result<Self, DecodeError> {
        Self::with_config(source, boundary, DecoderConfig::default())
    }

    /// Open a body and consume its opening delimiter line.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::InvalidBoundary`] for an empty or CR/LF-bearing
    ///   boundary.
    /// - [`DecodeError::BoundaryMismatch`] when the body does not start with
    ///   `--boundary` followed by CRLF or `--`.
    /// - [`DecodeError::MissingHeaders`] for an empty header block that is
    ///   not immediately followed by the close delimiter.
    /// - [`DecodeError::Wire`] for I/O failures.
    pub fn with_config(source: R, boundary: &str, config: DecoderConfig) -> Result<Self, DecodeError> {
        if boundary.is_empty() || boundary.contains(['\r', '\n']) {
            return Err(DecodeError::InvalidBoundary {
                boundary: boundary.to_owned(),
            });
        }
        let capacity = capacity_for(boundary.len(), config.min_capacity);
        let mut decoder = Self {
            ring: RingReader::with_capacity(source, capacity),
            scanner: BoundaryScanner::new(boundary.as_bytes()),
            state: State::AwaitingHeaders { resume_at: None },
            head: PartHead::default(),
            current: None,
            parts_seen: 0,
            config,
        };
        tracing::debug!(boundary, capacity, "multipart decoder opened");
        decoder.open(boundary.as_bytes())?;
        Ok(decoder)
    }

    /// Whether another part follows.
    ///
    /// # Errors
    ///
    /// [`DecodeError::Sequencing`] while the current part is still open.
    pub fn has_next(&self) -> Result<bool, DecodeError> {
        match self.state {
            State::StreamingBody => Err(DecodeError::Sequencing),
            State::AwaitingHeaders { .. } => Ok(true),
            State::Done => Ok(false),
        }
    }

    /// Read the next header block and return a view of the part it heads.
    ///
    /// Returns `Ok(None)` once the close delimiter has been consumed.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::Sequencing`] while the previous part is still open.
    /// - Any header block or I/O error; the decoder is finished afterwards.
    pub fn next_part(&mut self) -> Result<Option<Part<'_, R>>, DecodeError> {
        let resume_at = match self.state {
            State::StreamingBody => return Err(DecodeError::Sequencing),
            State::Done => {
                self.current = None;
                return Ok(None);
            }
            State::AwaitingHeaders { resume_at } => resume_at,
        };
        if let Some(pos) = resume_at
            && self.ring.read_pos() != pos
        {
            self.ring.advance_to(pos);
        }

        let head = match read_header_block(&mut self.ring, &self.config) {
            Ok(head) => head,
            Err(e) => {
                self.fail();
                return Err(e);
            }
        };
        let index = self.parts_seen;
        self.parts_seen += 1;
        self.scanner.reset(self.ring.read_pos());
        tracing::debug!(
            index,
            name = head.disposition.as_ref().and_then(|d| d.get("name")),
            body_start = self.ring.read_pos(),
            "part started"
        );
        self.head = head;
        self.current = Some(index);
        self.state = State::StreamingBody;
        Ok(Some(Part::new(self, index)))
    }

    /// Headers of the current part, if a part has been returned and the
    /// sequence has not ended.
    pub fn headers(&self) -> Option<&HeaderMap> {
        self.current.map(|_| &self.head.headers)
    }

    /// Charset assumed for `text/plain` parts without a `charset` parameter.
    pub fn default_charset(&self) -> &'static Encoding {
        self.config.default_charset
    }

    pub fn set_default_charset(&mut self, charset: &'static Encoding) {
        self.config.default_charset = charset;
    }

    /// Number of parts returned so far.
    pub fn parts_seen(&self) -> usize {
        self.parts_seen
    }

    /// Absolute offset of the next unconsumed body byte.
    pub fn position(&self) -> u64 {
        self.ring.read_pos()
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Whether the close delimiter has been reached (or decoding failed).
    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }

    /// Give back the byte source. Bytes already buffered are lost.
    pub fn into_inner(self) -> R {
        self.ring.into_inner()
    }

    /// Deliver body bytes of the open part into `buf`.
    ///
    /// Bytes are handed out only once the scanner has ruled out that they
    /// start a delimiter. Returns `Ok(0)` at the delimiter and advances the
    /// state machine.
    pub(crate) fn read_body(&mut self, buf: &mut [u8]) -> Result<usize, DecodeError> {
        loop {
            let outcome = self.scanner.scan(&self.ring)?;
            let n = self.ring.copy_out(self.scanner.deliverable_end(), buf);
            if n > 0 {
                return Ok(n);
            }
            if let ScanOutcome::Found(found) = outcome {
                self.end_part(found);
                return Ok(0);
            }
            self.ring.fill()?;
        }
    }

    fn end_part(&mut self, found: BoundaryMatch) {
        tracing::debug!(
            index = self.current,
            end = found.start,
            kind = ?found.kind,
            "part finished"
        );
        match found.kind {
            BoundaryKind::Continuing => {
                self.state = State::AwaitingHeaders {
                    resume_at: Some(found.trailer_start),
                };
            }
            BoundaryKind::Final => {
                self.ring.advance_to(found.trailer_start);
                self.state = State::Done;
                tracing::debug!(parts = self.parts_seen, "close delimiter reached");
            }
        }
    }

    pub(crate) fn fail(&mut self) {
        self.state = State::Done;
    }

    /// Consume `--boundary` and classify what follows it.
    fn open(&mut self, boundary: &[u8]) -> Result<(), DecodeError> {
        self.expect(b"--")?;
        self.expect(boundary)?;

        if self.skip(b"--")? {
            self.skip_line_end()?;
            self.state = State::Done;
            tracing::debug!("empty form");
            return Ok(());
        }
        self.skip_padding()?;
        self.expect(b"\r\n")?;

        self.ring.fill_to(1)?;
        if self.ring.byte_at(self.ring.read_pos()) == Some(b'\r') {
            let mut close = self.scanner.delimiter().to_vec();
            close.extend_from_slice(b"--");
            if !self.skip(&close)? {
                return Err(DecodeError::MissingHeaders);
            }
            self.skip_line_end()?;
            self.state = State::Done;
            tracing::debug!("headerless empty form");
        }
        Ok(())
    }

    /// Offset of the first byte at the read position that differs from
    /// `literal`, or `None` if the whole literal is buffered and matches.
    fn mismatch(&mut self, literal: &[u8]) -> Result<Option<u64>, DecodeError> {
        self.ring.fill_to(literal.len())?;
        let start = self.ring.read_pos();
        Ok((start..)
            .zip(literal)
            .find(|&(pos, &b)| self.ring.byte_at(pos) != Some(b))
            .map(|(pos, _)| pos))
    }

    fn expect(&mut self, literal: &[u8]) -> Result<(), DecodeError> {
        match self.mismatch(literal)? {
            None => {
                self.ring.consume(literal.len());
                Ok(())
            }
            Some(offset) => Err(DecodeError::BoundaryMismatch { offset }),
        }
    }

    fn skip(&mut self, literal: &[u8]) -> Result<bool, DecodeError> {
        let matched = self.mismatch(literal)?.is_none();
        if matched {
            self.ring.consume(literal.len());
        }
        Ok(matched)
    }

    fn skip_padding(&mut self) -> Result<(), DecodeError> {
        while self.ring.fill_to(1)? {
            match self.ring.byte_at(self.ring.read_pos()) {
                Some(b' ' | b'\t') => self.ring.consume(1),
                _ => break,
            }
        }
        Ok(())
    }

    fn skip_line_end(&mut self) -> Result<(), DecodeError> {
        self.skip_padding()?;
        self.skip(b"\r\n")?;
        Ok(())
    }
}
