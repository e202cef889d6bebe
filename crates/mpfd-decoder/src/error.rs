use std::io;

use mpfd_headers::HeaderError;
use mpfd_wire::WireError;

/// Errors that can occur while decoding a `multipart/form-data` body.
///
/// Every error is fatal for the body being decoded: the decoder reports no
/// further parts afterwards. Running out of parts is not an error;
/// [`PartDecoder::next_part`](crate::PartDecoder::next_part) returns
/// `Ok(None)`.
///
/// Error hierarchy:
///
/// ```text
///   DecodeError
///   ├── InvalidBoundary              ← empty or CR/LF-bearing boundary
///   ├── BoundaryMismatch             ← body does not open with --boundary
///   ├── MissingHeaders               ← headerless body not immediately closed
///   ├── Sequencing                   ← previous part neither drained nor closed
///   ├── TooManyHeaders               ← header block over the configured limit
///   ├── LimitExceeded                ← form collector limits
///   ├── NotMultipart                 ← Content-Type is not multipart/form-data
///   ├── MissingBoundary              ← Content-Type has no boundary parameter
///   ├── Header(HeaderError)          ← from mpfd-headers tokenizing
///   └── Wire(WireError)              ← truncation, line framing, I/O
/// ```
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The boundary token cannot delimit anything.
    #[error("invalid boundary {boundary:?}: must be non-empty and free of CR/LF")]
    InvalidBoundary { boundary: String },

    /// The body does not start with `--boundary`.
    ///
    /// `offset` is the first byte that differs, or the end of the stream
    /// when it ran out first.
    #[error("body does not open with the boundary delimiter (mismatch at offset {offset})")]
    BoundaryMismatch { offset: u64 },

    /// An empty header block was not followed by the close delimiter.
    ///
    /// The only headerless body accepted is the RFC 7578 empty form,
    /// `--boundary CRLF CRLF--boundary--`.
    #[error("part has no header block")]
    MissingHeaders,

    /// A part was requested while the previous one was still open.
    ///
    /// Read a part to its end or call [`Part::close`](crate::Part::close)
    /// before asking for the next one.
    #[error("previous part was neither read to its end nor closed")]
    Sequencing,

    /// A part carried more header lines than allowed.
    #[error("part has more than {limit} headers")]
    TooManyHeaders { limit: usize },

    /// A form collector limit was exceeded.
    #[error("{what} exceeds the limit of {limit}")]
    LimitExceeded { what: &'static str, limit: u64 },

    /// The request Content-Type is not `multipart/form-data`.
    #[error("content type {media_type:?} is not multipart/form-data")]
    NotMultipart { media_type: String },

    /// The request Content-Type has no usable `boundary` parameter.
    #[error("multipart content type has no boundary parameter")]
    MissingBoundary,

    /// A header value failed to tokenize.
    #[error(transparent)]
    Header(#[from] HeaderError),

    /// A byte-level error from `mpfd-wire`, including I/O failures.
    #[error(transparent)]
    Wire(#[from] WireError),
}

impl DecodeError {
    /// Recover a `DecodeError` that was passed through [`std::io::Read`].
    ///
    /// Errors produced by [`Part`](crate::Part)'s `Read` impl round-trip
    /// exactly; any other I/O error becomes [`WireError::Io`].
    pub fn from_io(err: io::Error) -> Self {
        let kind = err.kind();
        if !err.get_ref().is_some_and(|inner| inner.is::<Self>()) {
            return Self::Wire(WireError::Io(err));
        }
        match err.into_inner().map(|inner| inner.downcast::<Self>()) {
            Some(Ok(decode)) => *decode,
            Some(Err(other)) => Self::Wire(WireError::Io(io::Error::new(kind, other))),
            None => Self::Wire(WireError::Io(io::Error::from(kind))),
        }
    }
}

impl From<DecodeError> for io::Error {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::Wire(WireError::Io(io)) => io,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_errors_survive_io_round_trip() {
        let io_err = io::Error::from(DecodeError::Sequencing);
        assert_eq!(io_err.kind(), io::ErrorKind::InvalidData);
        assert!(matches!(DecodeError::from_io(io_err), DecodeError::Sequencing));
    }

    #[test]
    fn io_errors_pass_through_untouched() {
        let original = io::Error::new(io::ErrorKind::ConnectionReset, "peer went away");
        let io_err = io::Error::from(DecodeError::Wire(WireError::Io(original)));
        assert_eq!(io_err.kind(), io::ErrorKind::ConnectionReset);
        assert!(matches!(
            DecodeError::from_io(io_err),
            DecodeError::Wire(WireError::Io(e)) if e.kind() == io::ErrorKind::ConnectionReset
        ));
    }
}
