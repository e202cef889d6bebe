/// Implementation of `mpfd validate`.
///
/// Decodes the whole body, draining every part, and reports either a series
/// of success checkmarks (`✓`) or a diagnostic failure line (`✗`). The
/// command exits with code 0 on a valid body and code 1 on any error.
///
/// # Success output
///
/// ```text
/// ✓ Opening: body starts with the boundary delimiter
/// ✓ Parts: 3 parts decoded (2 fields, 1 file)
/// ✓ Closing: final boundary at offset 512
/// ```
///
/// # Failure output
///
/// ```text
/// ✗ Error: part 2: body ends before the closing boundary (at offset 377)
/// ```
///
/// # Validation steps
///
/// ```text
/// 1. Opening: `--boundary` at offset 0, padding, CRLF
/// 2. Headers: every part's header block terminates and parses
/// 3. Bodies: every body is closed by a delimiter before EOF
/// 4. Closing: the final `--boundary--` delimiter is present
/// ```
use anyhow::{Result, anyhow};
use mpfd_decoder::DecodeError;
use mpfd_headers::HeaderError;
use mpfd_wire::WireError;

use crate::ValidateArgs;

/// Run the `mpfd validate` command.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or the body fails any
/// structural check.
pub fn run(args: &ValidateArgs) -> Result<()> {
    let mut decoder = match args.body.open() {
        Ok(decoder) => decoder,
        Err(e) => {
            println!("✗ Error: {e:#}");
            return Err(anyhow!("validation failed"));
        }
    };
    println!("✓ Opening: body starts with the boundary delimiter");

    let mut fields = 0usize;
    let mut files = 0usize;
    loop {
        let index = decoder.parts_seen();
        let mut part = match decoder.next_part() {
            Ok(Some(part)) => part,
            Ok(None) => break,
            Err(e) => return fail(&format!("part {index}: {}", decode_error_diagnostic(&e))),
        };
        let is_file = part.is_file();
        if let Err(e) = part.close() {
            return fail(&format!("part {index}: {}", decode_error_diagnostic(&e)));
        }
        if is_file {
            files += 1;
        } else {
            fields += 1;
        }
    }

    let total = fields + files;
    println!(
        "✓ Parts: {total} part{} decoded ({fields} field{}, {files} file{})",
        plural(total),
        plural(fields),
        plural(files)
    );
    println!("✓ Closing: final boundary at offset {}", decoder.position());
    Ok(())
}

fn fail(diagnostic: &str) -> Result<()> {
    println!("✗ Error: {diagnostic}");
    Err(anyhow!("validation failed"))
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

// ── Error formatting ──────────────────────────────────────────────────────────

/// Converts a `DecodeError` into a human-readable diagnostic string.
///
/// ```text
/// ┌──────────────────────────┬──────────────────────────────────────────────┐
/// │ Error                    │ Diagnostic message                           │
/// ├──────────────────────────┼──────────────────────────────────────────────┤
/// │ Wire::TruncatedBody      │ "body ends before the closing boundary ..."  │
/// │ Wire::LineTermination    │ "header line not terminated by CRLF ..."     │
/// │ Header::MalformedLine    │ "malformed header line ..."                  │
/// │ Sequencing               │ "parts read out of order"                    │
/// │ everything else          │ "<error Display>"                            │
/// └──────────────────────────┴──────────────────────────────────────────────┘
/// ```
fn decode_error_diagnostic(e: &DecodeError) -> String {
    match e {
        DecodeError::Wire(WireError::TruncatedBody { offset }) => {
            format!("body ends before the closing boundary (at offset {offset})")
        }
        DecodeError::Wire(WireError::LineTermination { offset }) => {
            format!("header line not terminated by CRLF (at offset {offset})")
        }
        DecodeError::Header(HeaderError::MalformedLine { line }) => {
            format!("malformed header line {line:?}")
        }
        DecodeError::Sequencing => "parts read out of order".to_string(),
        other => other.to_string(),
    }
}
