use encoding_rs::Encoding;
use mpfd_wire::ring::DEFAULT_MIN_CAPACITY;

/// Default bound on one (unfolded) header line.
pub const DEFAULT_MAX_HEADER_LINE: usize = 8 * 1024;

/// Default bound on the number of headers in one part.
pub const DEFAULT_MAX_HEADERS: usize = 64;

/// Configuration for a [`PartDecoder`](crate::PartDecoder).
///
/// ```text
/// ┌─────────────────┬───────────┬──────────────────────────────────────────┐
/// │ Field           │ Default   │ Purpose                                  │
/// ├─────────────────┼───────────┼──────────────────────────────────────────┤
/// │ min_capacity    │ 512       │ Floor for the ring buffer size           │
/// │ max_header_line │ 8 KiB     │ Longest accepted logical header line     │
/// │ max_headers     │ 64        │ Most headers accepted per part           │
/// │ default_charset │ UTF-8     │ Charset for text/plain without charset=  │
/// └─────────────────┴───────────┴──────────────────────────────────────────┘
/// ```
///
/// The ring capacity is the smallest power of two that is at least
/// `min_capacity` and at least twice the delimiter length, so small floors
/// are always safe.
#[derive(Clone, Debug)]
pub struct DecoderConfig {
    pub min_capacity: usize,
    pub max_header_line: usize,
    pub max_headers: usize,
    pub default_charset: &'static Encoding,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            min_capacity: DEFAULT_MIN_CAPACITY,
            max_header_line: DEFAULT_MAX_HEADER_LINE,
            max_headers: DEFAULT_MAX_HEADERS,
            default_charset: encoding_rs::UTF_8,
        }
    }
}

impl DecoderConfig {
    #[must_use]
    pub fn min_capacity(mut self, bytes: usize) -> Self {
        self.min_capacity = bytes;
        self
    }

    #[must_use]
    pub fn max_header_line(mut self, bytes: usize) -> Self {
        self.max_header_line = bytes;
        self
    }

    #[must_use]
    pub fn max_headers(mut self, count: usize) -> Self {
        self.max_headers = count;
        self
    }

    #[must_use]
    pub fn default_charset(mut self, charset: &'static Encoding) -> Self {
        self.default_charset = charset;
        self
    }
}
