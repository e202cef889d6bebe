use std::io::Read;

use crate::error::WireError;
use crate::ring::RingReader;

/// Read one CRLF-terminated line into `line`, consuming the terminator.
///
/// The line is accumulated outside the ring, so it may be longer than the
/// ring capacity; `limit` bounds it instead. A bare LF is ordinary content.
/// An empty `line` on return means a blank line (end of a header block).
///
/// # Errors
///
/// - [`WireError::LineTermination`] for a CR not followed by LF, or end of
///   stream before the terminator.
/// - [`WireError::LineTooLong`] when the line exceeds `limit` bytes.
/// - [`WireError::Io`] from the source.
pub fn read_line<R: Read>(
    ring: &mut RingReader<R>,
    line: &mut Vec<u8>,
    limit: usize,
) -> Result<(), WireError> {
    line.clear();
    loop {
        if ring.available() < 2 {
            ring.fill()?;
        }
        let pos = ring.read_pos();
        match ring.byte_at(pos) {
            Some(b'\r') => match ring.byte_at(pos + 1) {
                Some(b'\n') => {
                    ring.consume(2);
                    return Ok(());
                }
                Some(_) => return Err(WireError::LineTermination { offset: pos }),
                None if ring.is_eof() => return Err(WireError::LineTermination { offset: pos }),
                None => {}
            },
            Some(b) => {
                if line.len() >= limit {
                    return Err(WireError::LineTooLong { limit });
                }
                line.push(b);
                ring.consume(1);
            }
            None => return Err(WireError::LineTermination { offset: pos }),
        }
    }
}
