/// Errors raised by the byte-level layer: buffering, delimiter scanning and
/// CRLF line framing.
///
/// Offsets are absolute positions in the body stream, counted from the first
/// byte the decoder ever read.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The stream ended before the closing delimiter of the current part.
    #[error("multipart body truncated: stream ended at offset {offset} before a boundary")]
    TruncatedBody { offset: u64 },

    /// A header line contained a bare CR, or the stream ended mid-line.
    #[error("header line at offset {offset} is not terminated by CRLF")]
    LineTermination { offset: u64 },

    /// A header line grew past the configured limit.
    #[error("header line exceeds {limit} bytes")]
    LineTooLong { limit: usize },

    /// I/O error from the underlying byte source.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// NOTE
// Offsets are u64 rather than usize: the decoder never holds the whole body,
// so positions are stream counters, not indices into a slice.
