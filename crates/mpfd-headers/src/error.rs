/// Errors raised while reading header lines or tokenizing header values.
///
/// Every variant carries enough context to point at the offending header.
/// Header values are stored raw and tokenized on demand, so a `HeaderError`
/// for an ordinary header surfaces from the accessor that parsed it, not
/// from the decoder.
///
/// # Error hierarchy
///
/// ```text
/// ┌──────────────────────────────────────────────────────────┐
/// │ HeaderError (this crate)                                 │
/// │   ├── UnbalancedQuote for a quoted-string left open      │
/// │   ├── UnbalancedComment for stray or unclosed parens     │
/// │   └── MalformedLine for header lines without a name      │
/// └──────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, thiserror::Error)]
pub enum HeaderError {
  /// A `"` opened a quoted-string that was never closed.
  #[error("unbalanced quotes in {header} header")]
  UnbalancedQuote { header: String },

  /// A `)` appeared outside any comment, or a `(` was never closed.
  #[error("unbalanced comment nesting in {header} header")]
  UnbalancedComment { header: String },

  /// A header line had no `:` or an empty / non-token name.
  #[error("malformed header line: {line:?}")]
  MalformedLine { line: String },
}
