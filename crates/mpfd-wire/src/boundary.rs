use crate::error::WireError;
use crate::ring::RingReader;

/// How a confirmed delimiter ends the current part.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoundaryKind {
    /// `CRLF--boundary CRLF`: another header block follows.
    Continuing,
    /// `CRLF--boundary--`: the close delimiter, no parts follow.
    Final,
}

/// A delimiter confirmed in the buffered window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundaryMatch {
    /// Position of the delimiter's leading CR: the end of the part body.
    pub start: u64,
    /// First position after the delimiter line (padding and CRLF included).
    pub trailer_start: u64,
    pub kind: BoundaryKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanOutcome {
    Found(BoundaryMatch),
    /// The window ended before a decision; fill the ring and scan again.
    Pending,
}

enum Probe {
    Match(BoundaryMatch),
    Mismatch,
    NeedMore,
}

enum LineEnd {
    Crlf(u64),
    Other,
    NeedMore,
    Eof,
}

/// Incremental search for `CRLF--boundary` over a [`RingReader`].
///
/// The scanner keeps a checkpoint, `search_from`, so bytes already rejected
/// are never examined twice however the stream is chunked. Candidates are CR
/// bytes; a candidate that turns out not to start a delimiter is skipped and
/// the search resumes at the next CR.
///
/// ```text
///   body bytes ...........\r\n--boundary[--][ \t]*\r\n
///   ▲ read_pos            ▲ start                     ▲ trailer_start
///   └── deliverable ──────┘
/// ```
///
/// Bytes before [`deliverable_end`](Self::deliverable_end) are known not to
/// belong to a delimiter and may be handed to the caller.
pub struct BoundaryScanner {
    delimiter: Box<[u8]>,
    search_from: u64,
    found: Option<BoundaryMatch>,
}

impl BoundaryScanner {
    pub fn new(boundary: &[u8]) -> Self {
        let mut delimiter = Vec::with_capacity(boundary.len() + 4);
        delimiter.extend_from_slice(b"\r\n--");
        delimiter.extend_from_slice(boundary);
        Self {
            delimiter: delimiter.into_boxed_slice(),
            search_from: 0,
            found: None,
        }
    }

    /// The full delimiter, `CRLF--boundary`.
    pub fn delimiter(&self) -> &[u8] {
        &self.delimiter
    }

    pub fn search_from(&self) -> u64 {
        self.search_from
    }

    /// The confirmed match, if the last scan found one.
    pub fn found(&self) -> Option<BoundaryMatch> {
        self.found
    }

    /// Forget any match and start searching again at `pos`.
    pub fn reset(&mut self, pos: u64) {
        self.search_from = pos;
        self.found = None;
    }

    /// Position up to which buffered bytes are safe to deliver as body data.
    pub fn deliverable_end(&self) -> u64 {
        self.found.map_or(self.search_from, |m| m.start)
    }

    /// Search the unconsumed window for the next delimiter.
    ///
    /// Once a match is found it is returned on every call until
    /// [`reset`](Self::reset).
    ///
    /// # Errors
    ///
    /// Returns [`WireError::TruncatedBody`] when the source has ended and the
    /// remaining bytes cannot contain a delimiter.
    pub fn scan<R>(&mut self, ring: &RingReader<R>) -> Result<ScanOutcome, WireError> {
        if let Some(found) = self.found {
            return Ok(ScanOutcome::Found(found));
        }
        let mut pos = self.search_from.max(ring.read_pos());
        loop {
            let Some(candidate) = find_cr(ring, pos) else {
                self.search_from = ring.write_pos();
                return pending(ring);
            };
            self.search_from = candidate;
            match self.probe(ring, candidate) {
                Probe::Match(found) => {
                    tracing::trace!(start = found.start, kind = ?found.kind, "delimiter confirmed");
                    self.found = Some(found);
                    return Ok(ScanOutcome::Found(found));
                }
                Probe::Mismatch => pos = candidate + 1,
                Probe::NeedMore => return pending(ring),
            }
        }
    }

    fn probe<R>(&self, ring: &RingReader<R>, start: u64) -> Probe {
        let mut pos = start;
        for &expected in &*self.delimiter {
            match ring.byte_at(pos) {
                Some(b) if b == expected => pos += 1,
                Some(_) => return Probe::Mismatch,
                None => return starved(ring, start),
            }
        }

        match ring.byte_at(pos) {
            Some(b'-') => match ring.byte_at(pos + 1) {
                Some(b'-') => {
                    let after = pos + 2;
                    let trailer_start = match line_end(ring, after) {
                        LineEnd::Crlf(next) => next,
                        // Lenient close: `--` needs no CRLF before EOF or junk.
                        LineEnd::Other | LineEnd::Eof => after,
                        LineEnd::NeedMore if window_full(ring, start) => after,
                        LineEnd::NeedMore => return Probe::NeedMore,
                    };
                    Probe::Match(BoundaryMatch {
                        start,
                        trailer_start,
                        kind: BoundaryKind::Final,
                    })
                }
                Some(_) => Probe::Mismatch,
                None => starved(ring, start),
            },
            Some(_) => match line_end(ring, pos) {
                LineEnd::Crlf(trailer_start) => Probe::Match(BoundaryMatch {
                    start,
                    trailer_start,
                    kind: BoundaryKind::Continuing,
                }),
                LineEnd::Other | LineEnd::Eof => Probe::Mismatch,
                LineEnd::NeedMore => starved(ring, start),
            },
            None => starved(ring, start),
        }
    }
}

fn pending<R>(ring: &RingReader<R>) -> Result<ScanOutcome, WireError> {
    match ring.end() {
        Some(offset) => Err(WireError::TruncatedBody { offset }),
        None => Ok(ScanOutcome::Pending),
    }
}

/// A candidate that cannot be decided with more input is not a delimiter:
/// either the stream ended, or the window from `start` already spans the
/// whole ring.
fn starved<R>(ring: &RingReader<R>, start: u64) -> Probe {
    if ring.is_eof() || window_full(ring, start) {
        Probe::Mismatch
    } else {
        Probe::NeedMore
    }
}

fn window_full<R>(ring: &RingReader<R>, start: u64) -> bool {
    ring.write_pos() - start >= ring.capacity() as u64
}

/// Skip transport padding and look for CRLF at `pos`.
fn line_end<R>(ring: &RingReader<R>, mut pos: u64) -> LineEnd {
    loop {
        match ring.byte_at(pos) {
            Some(b' ' | b'\t') => pos += 1,
            Some(b'\r') => {
                return match ring.byte_at(pos + 1) {
                    Some(b'\n') => LineEnd::Crlf(pos + 2),
                    Some(_) => LineEnd::Other,
                    None if ring.is_eof() => LineEnd::Other,
                    None => LineEnd::NeedMore,
                };
            }
            Some(_) => return LineEnd::Other,
            None if ring.is_eof() => return LineEnd::Eof,
            None => return LineEnd::NeedMore,
        }
    }
}

fn find_cr<R>(ring: &RingReader<R>, from: u64) -> Option<u64> {
    let (head, tail) = ring.slices(from, ring.write_pos());
    memchr::memchr(b'\r', head)
        .map(|i| from + i as u64)
        .or_else(|| memchr::memchr(b'\r', tail).map(|i| from + (head.len() + i) as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor, Read};

    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        chunk: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.chunk.min(buf.len()).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    fn loaded(data: &[u8], capacity: usize) -> RingReader<Cursor<Vec<u8>>> {
        let mut ring = RingReader::with_capacity(Cursor::new(data.to_vec()), capacity);
        ring.fill().unwrap();
        ring.fill().unwrap();
        ring
    }

    /// Deliver body bytes until the scanner confirms a delimiter at the
    /// read position.
    fn drive<R: Read>(ring: &mut RingReader<R>, scanner: &mut BoundaryScanner) -> (Vec<u8>, BoundaryMatch) {
        let mut body = Vec::new();
        let mut scratch = [0u8; 64];
        loop {
            let outcome = scanner.scan(ring).unwrap();
            let n = ring.copy_out(scanner.deliverable_end(), &mut scratch);
            body.extend_from_slice(&scratch[..n]);
            if let ScanOutcome::Found(m) = outcome
                && ring.read_pos() == m.start
            {
                return (body, m);
            }
            if n == 0 {
                ring.fill().unwrap();
            }
        }
    }

    #[test]
    fn continuing_delimiter() {
        let ring = loaded(b"hello\r\n--XYZ\r\nnext", 64);
        let mut scanner = BoundaryScanner::new(b"XYZ");
        let outcome = scanner.scan(&ring).unwrap();
        assert_eq!(
            outcome,
            ScanOutcome::Found(BoundaryMatch {
                start: 5,
                trailer_start: 14,
                kind: BoundaryKind::Continuing,
            })
        );
        assert_eq!(scanner.deliverable_end(), 5);
    }

    #[test]
    fn final_delimiter_consumes_crlf() {
        let ring = loaded(b"abc\r\n--XYZ--\r\nepilogue", 64);
        let mut scanner = BoundaryScanner::new(b"XYZ");
        let ScanOutcome::Found(m) = scanner.scan(&ring).unwrap() else {
            panic!("expected a match");
        };
        assert_eq!(m.kind, BoundaryKind::Final);
        assert_eq!(m.start, 3);
        assert_eq!(m.trailer_start, 14);
    }

    #[test]
    fn final_delimiter_at_eof() {
        let ring = loaded(b"abc\r\n--XYZ--", 64);
        let mut scanner = BoundaryScanner::new(b"XYZ");
        let ScanOutcome::Found(m) = scanner.scan(&ring).unwrap() else {
            panic!("expected a match");
        };
        assert_eq!(m.kind, BoundaryKind::Final);
        assert_eq!(m.trailer_start, 12);
    }

    #[test]
    fn look_alike_is_body_data() {
        let ring = loaded(b"a\r\n--XYZW\r\n--XYZ\r\n", 64);
        let mut scanner = BoundaryScanner::new(b"XYZ");
        let ScanOutcome::Found(m) = scanner.scan(&ring).unwrap() else {
            panic!("expected a match");
        };
        assert_eq!(m.start, 9);
        assert_eq!(m.trailer_start, 18);
    }

    #[test]
    fn padding_before_crlf() {
        let ring = loaded(b"x\r\n--XYZ \t \r\nrest", 64);
        let mut scanner = BoundaryScanner::new(b"XYZ");
        let ScanOutcome::Found(m) = scanner.scan(&ring).unwrap() else {
            panic!("expected a match");
        };
        assert_eq!(m.kind, BoundaryKind::Continuing);
        assert_eq!(m.trailer_start, 13);
    }

    #[test]
    fn partial_delimiter_is_pending() {
        let mut ring = RingReader::with_capacity(Cursor::new(b"abc\r\n--X".to_vec()), 16);
        ring.fill().unwrap();
        let mut scanner = BoundaryScanner::new(b"XYZ");
        assert_eq!(scanner.scan(&ring).unwrap(), ScanOutcome::Pending);
        assert_eq!(scanner.deliverable_end(), 3);
    }

    #[test]
    fn eof_without_delimiter_is_truncated() {
        let ring = loaded(b"abc\r\n--X", 16);
        let mut scanner = BoundaryScanner::new(b"XYZ");
        assert!(matches!(
            scanner.scan(&ring),
            Err(WireError::TruncatedBody { offset: 8 })
        ));
    }

    #[test]
    fn delimiter_without_terminator_at_eof_is_truncated() {
        let ring = loaded(b"abc\r\n--XYZ", 16);
        let mut scanner = BoundaryScanner::new(b"XYZ");
        assert!(matches!(
            scanner.scan(&ring),
            Err(WireError::TruncatedBody { .. })
        ));
    }

    #[test]
    fn oversized_padding_does_not_stall() {
        let mut data = b"\r\n--XYZ".to_vec();
        data.extend_from_slice(&[b' '; 20]);
        data.extend_from_slice(b"\r\n");
        let mut ring = RingReader::with_capacity(Cursor::new(data), 16);
        ring.fill().unwrap();
        let mut scanner = BoundaryScanner::new(b"XYZ");
        assert_eq!(scanner.scan(&ring).unwrap(), ScanOutcome::Pending);
        assert_eq!(scanner.deliverable_end(), 16);
    }

    #[test]
    fn straddling_delimiter_with_tiny_reads() {
        let mut data = Vec::new();
        for i in 0..40u8 {
            data.push(b'a' + i % 26);
            if i % 7 == 0 {
                data.extend_from_slice(b"\r\n--XY");
            }
        }
        let body = data.clone();
        data.extend_from_slice(b"\r\n--XYZ--\r\n");

        for chunk in 1..=7 {
            let src = Trickle { data: data.clone(), pos: 0, chunk };
            let mut ring = RingReader::with_capacity(src, 16);
            let mut scanner = BoundaryScanner::new(b"XYZ");
            let (got, m) = drive(&mut ring, &mut scanner);
            assert_eq!(got, body, "chunk size {chunk}");
            assert_eq!(m.kind, BoundaryKind::Final);
            assert_eq!(m.start, body.len() as u64);
        }
    }

    #[test]
    fn reset_starts_a_new_search() {
        let mut ring = loaded(b"a\r\n--XYZ\r\nb\r\n--XYZ--", 64);
        let mut scanner = BoundaryScanner::new(b"XYZ");
        let (first, m) = drive(&mut ring, &mut scanner);
        assert_eq!(first, b"a");
        ring.advance_to(m.trailer_start);
        scanner.reset(m.trailer_start);
        let (second, m) = drive(&mut ring, &mut scanner);
        assert_eq!(second, b"b");
        assert_eq!(m.kind, BoundaryKind::Final);
    }
}
