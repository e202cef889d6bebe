use std::io::{ErrorKind, Read};

use crate::error::WireError;

/// Smallest ring capacity used unless the caller asks for a different floor.
pub const DEFAULT_MIN_CAPACITY: usize = 512;

/// Ring capacity for a given boundary length.
///
/// The buffer must hold two full delimiters (`CRLF--boundary` plus its
/// two-byte trailer) so a delimiter can always be confirmed without
/// discarding bytes that may still belong to the body. The result is the
/// smallest power of two covering both that and `floor`.
///
/// ```text
/// boundary len   floor   capacity
/// ────────────   ─────   ────────
///      3           16        16
///      4          512       512
///    300          512      1024
/// ```
#[must_use]
pub fn capacity_for(boundary_len: usize, floor: usize) -> usize {
    let needed = 2 * (boundary_len + 4);
    needed.max(floor).max(1).next_power_of_two()
}

/// A fixed-capacity circular buffer over a blocking byte source.
///
/// Positions are absolute stream offsets (`u64`) that only ever grow; the
/// buffer slot for a position is `pos & (capacity - 1)`. Callers never see
/// the masking: every accessor takes and returns absolute positions.
///
/// ```text
///            read_pos                write_pos
///               │   valid, unconsumed    │      free
///   ────────────┼────────────────────────┼──────────────
///   consumed    │████████████████████████│
/// ```
///
/// Invariant: `read_pos <= write_pos <= read_pos + capacity`.
pub struct RingReader<R> {
    source: R,
    buf: Box<[u8]>,
    mask: u64,
    read_pos: u64,
    write_pos: u64,
    end: Option<u64>,
}

impl<R> RingReader<R> {
    /// Wrap `source` with a buffer of at least `capacity` bytes.
    ///
    /// The capacity is rounded up to a power of two (minimum 1).
    pub fn with_capacity(source: R, capacity: usize) -> Self {
        let capacity = capacity.max(1).next_power_of_two();
        Self {
            source,
            buf: vec![0u8; capacity].into_boxed_slice(),
            mask: capacity as u64 - 1,
            read_pos: 0,
            write_pos: 0,
            end: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Absolute position of the next unconsumed byte.
    pub fn read_pos(&self) -> u64 {
        self.read_pos
    }

    /// Absolute position one past the last buffered byte.
    pub fn write_pos(&self) -> u64 {
        self.write_pos
    }

    /// Absolute end-of-stream position, once the source has reported it.
    pub fn end(&self) -> Option<u64> {
        self.end
    }

    /// Whether the source has reported end of stream. Buffered bytes may
    /// still be pending.
    pub fn is_eof(&self) -> bool {
        self.end.is_some()
    }

    /// Whether every byte of the stream has been consumed.
    pub fn is_drained(&self) -> bool {
        self.end == Some(self.read_pos)
    }

    /// Number of buffered, unconsumed bytes.
    #[allow(clippy::cast_possible_truncation)]
    pub fn available(&self) -> usize {
        // Bounded by capacity, which is a usize.
        (self.write_pos - self.read_pos) as usize
    }

    /// Number of bytes a fill could add without overwriting unread data.
    pub fn free(&self) -> usize {
        self.capacity() - self.available()
    }

    /// Byte at absolute position `pos`, if it is buffered and unconsumed.
    pub fn byte_at(&self, pos: u64) -> Option<u8> {
        (self.read_pos..self.write_pos)
            .contains(&pos)
            .then(|| self.buf[self.slot(pos)])
    }

    /// The buffered window `[from, to)` as one or two contiguous slices.
    ///
    /// The window is clamped to the unconsumed region. The second slice is
    /// empty unless the window wraps around the end of the buffer.
    #[allow(clippy::cast_possible_truncation)]
    pub fn slices(&self, from: u64, to: u64) -> (&[u8], &[u8]) {
        let from = from.clamp(self.read_pos, self.write_pos);
        let to = to.clamp(from, self.write_pos);
        let len = (to - from) as usize;
        let start = self.slot(from);
        let head = len.min(self.buf.len() - start);
        (&self.buf[start..start + head], &self.buf[..len - head])
    }

    /// Mark `n` bytes as consumed. Never moves past `write_pos`.
    pub fn consume(&mut self, n: usize) {
        self.advance_to(self.read_pos.saturating_add(n as u64));
    }

    /// Move `read_pos` forward to `pos`, clamped to the buffered region.
    pub fn advance_to(&mut self, pos: u64) {
        self.read_pos = pos.clamp(self.read_pos, self.write_pos);
    }

    /// Copy bytes from `read_pos` up to `limit` (exclusive) into `out` and
    /// consume them. Returns the number of bytes copied.
    #[allow(clippy::cast_possible_truncation)]
    pub fn copy_out(&mut self, limit: u64, out: &mut [u8]) -> usize {
        let limit = limit.min(self.write_pos);
        if limit <= self.read_pos {
            return 0;
        }
        let n = ((limit - self.read_pos) as usize).min(out.len());
        let (head, tail) = self.slices(self.read_pos, self.read_pos + n as u64);
        out[..head.len()].copy_from_slice(head);
        out[head.len()..n].copy_from_slice(tail);
        self.read_pos += n as u64;
        n
    }

    /// Unwrap the byte source, discarding any buffered bytes.
    pub fn into_inner(self) -> R {
        self.source
    }

    #[allow(clippy::cast_possible_truncation)]
    fn slot(&self, pos: u64) -> usize {
        (pos & self.mask) as usize
    }
}

impl<R: Read> RingReader<R> {
    /// Pull bytes from the source into the free part of the buffer.
    ///
    /// Issues at most one read per contiguous free slice and stops early on a
    /// short read. A zero-byte read records end of stream; after that, fill is
    /// a no-op. Returns the number of bytes added.
    ///
    /// # Errors
    ///
    /// Any I/O error other than `Interrupted` is returned as
    /// [`WireError::Io`].
    pub fn fill(&mut self) -> Result<usize, WireError> {
        let mut total = 0;
        while self.end.is_none() && self.free() > 0 {
            let start = self.slot(self.write_pos);
            let want = self.free().min(self.buf.len() - start);
            let n = match self.source.read(&mut self.buf[start..start + want]) {
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            if n == 0 {
                self.end = Some(self.write_pos);
                tracing::trace!(end = self.write_pos, "byte source exhausted");
                break;
            }
            self.write_pos += n as u64;
            total += n;
            if n < want {
                break;
            }
        }
        if total > 0 {
            tracing::trace!(
                bytes = total,
                read_pos = self.read_pos,
                write_pos = self.write_pos,
                "ring filled"
            );
        }
        Ok(total)
    }

    /// Fill until at least `n` bytes are buffered or the stream ends.
    ///
    /// `n` is clamped to the capacity. Returns whether `n` bytes are
    /// available.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from [`fill`](Self::fill).
    pub fn fill_to(&mut self, n: usize) -> Result<bool, WireError> {
        let n = n.min(self.capacity());
        while self.available() < n && !self.is_eof() {
            self.fill()?;
        }
        Ok(self.available() >= n)
    }
}
