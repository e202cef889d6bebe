//! HTTP header value tokenizer.
//!
//! Splits a raw header value into its bare value and `;`-separated
//! parameters, honouring quoted-strings, backslash escapes and nested
//! `(comments)`.
//!
//! ```text
//! form-data; name="field 1"; filename="a\"b.txt" (legacy)
//! ─────┬───  ──────┬───────  ──────────┬──────── ───┬────
//!  bare value   parameter       escaped quote     comment → " "
//! ```

use std::mem;

use crate::error::HeaderError;
use crate::params::ParsedHeaderValue;

/// Whether a top-level `,` separates header values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Commas {
    /// `,` ends the current value (`Accept: a, b`).
    Separate,
    /// `,` is ordinary text (`Content-Disposition`, `Content-Type`).
    Literal,
}

/// Tokenize the first value of `raw`. See [`parse_first`].
///
/// # Errors
///
/// See [`parse_first`].
pub fn parse(name: &str, raw: &str, commas: Commas) -> Result<ParsedHeaderValue, HeaderError> {
    parse_first(name, raw, commas).map(|(value, _)| value)
}

/// Tokenize the first value of header `name`.
///
/// Returns the parsed value and the byte offset in `raw` where the next
/// comma-separated value starts (`raw.len()` when there is none, which is
/// always the case under [`Commas::Literal`]).
///
/// # Errors
///
/// - [`HeaderError::UnbalancedQuote`] when a quoted-string is not closed.
/// - [`HeaderError::UnbalancedComment`] for a stray `)` or an unclosed `(`.
pub fn parse_first(
    name: &str,
    raw: &str,
    commas: Commas,
) -> Result<(ParsedHeaderValue, usize), HeaderError> {
    parse_from(name, raw, 0, commas)
}

/// Tokenize every comma-separated value of `raw`, skipping empty ones.
///
/// # Errors
///
/// See [`parse_first`].
pub fn parse_all(
    name: &str,
    raw: &str,
    commas: Commas,
) -> Result<Vec<ParsedHeaderValue>, HeaderError> {
    let mut values = Vec::new();
    let mut offset = 0;
    while offset < raw.len() {
        let (value, next) = parse_from(name, raw, offset, commas)?;
        if !value.is_empty() {
            values.push(value);
        }
        offset = next;
    }
    Ok(values)
}

fn parse_from(
    name: &str,
    raw: &str,
    start: usize,
    commas: Commas,
) -> Result<(ParsedHeaderValue, usize), HeaderError> {
    let mut tokenizer = Tokenizer::new(name, commas);
    let mut next = raw.len();
    for (i, ch) in raw[start..].char_indices() {
        if tokenizer.feed(ch)? {
            next = start + i + 1;
            break;
        }
    }
    Ok((tokenizer.finish()?, next))
}

fn is_ows(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Text of one key or value. Characters that came from a quoted-string or
/// an escape are never trimmed.
#[derive(Default)]
struct Token {
    text: String,
    protected: Option<(usize, usize)>,
}

impl Token {
    fn push(&mut self, ch: char) {
        self.text.push(ch);
    }

    fn push_protected(&mut self, ch: char) {
        let start = self.text.len();
        self.text.push(ch);
        let end = self.text.len();
        self.protected = Some(match self.protected {
            Some((s, _)) => (s, end),
            None => (start, end),
        });
    }

    fn finish(self) -> String {
        let text = self.text;
        let lead = text.len() - text.trim_start_matches(is_ows).len();
        let trail = text.trim_end_matches(is_ows).len();
        let (start, end) = match self.protected {
            Some((s, e)) => (lead.min(s), trail.max(e)),
            None => (lead, trail),
        };
        if start >= end {
            return String::new();
        }
        text[start..end].to_owned()
    }
}

struct Tokenizer {
    header: String,
    commas: Commas,
    quoted: bool,
    escaped: bool,
    depth: u32,
    segments: usize,
    key: Option<Token>,
    current: Token,
    out: ParsedHeaderValue,
}

impl Tokenizer {
    fn new(name: &str, commas: Commas) -> Self {
        Self {
            header: name.to_lowercase(),
            commas,
            quoted: false,
            escaped: false,
            depth: 0,
            segments: 0,
            key: None,
            current: Token::default(),
            out: ParsedHeaderValue::new(),
        }
    }

    /// Consume one character. Returns `true` when a separating comma ends
    /// the value.
    fn feed(&mut self, ch: char) -> Result<bool, HeaderError> {
        if self.escaped {
            self.escaped = false;
            if self.depth == 0 {
                self.current.push_protected(ch);
            }
            return Ok(false);
        }

        if self.depth > 0 {
            match ch {
                '\\' => self.escaped = true,
                '(' => self.depth += 1,
                ')' => {
                    self.depth -= 1;
                    if self.depth == 0 {
                        self.current.push(' ');
                    }
                }
                _ => {}
            }
            return Ok(false);
        }

        if self.quoted {
            match ch {
                '\\' => self.escaped = true,
                '"' => self.quoted = false,
                _ => self.current.push_protected(ch),
            }
            return Ok(false);
        }

        match ch {
            '"' => self.quoted = true,
            '(' => self.depth = 1,
            ')' => {
                return Err(HeaderError::UnbalancedComment {
                    header: self.header.clone(),
                });
            }
            ';' => self.end_segment(),
            '=' if self.key.is_none() => self.key = Some(mem::take(&mut self.current)),
            ',' if self.commas == Commas::Separate => return Ok(true),
            _ => self.current.push(ch),
        }
        Ok(false)
    }

    fn end_segment(&mut self) {
        let first = self.segments == 0;
        self.segments += 1;
        let text = mem::take(&mut self.current).finish();
        match self.key.take() {
            Some(key) => {
                let key = key.finish().to_lowercase();
                if !key.is_empty() {
                    self.out.insert(key, Some(text));
                }
            }
            None if text.is_empty() => {}
            None if first => self.out.insert(self.header.clone(), Some(text)),
            None => self.out.insert(text.to_lowercase(), None),
        }
    }

    fn finish(mut self) -> Result<ParsedHeaderValue, HeaderError> {
        if self.depth > 0 {
            return Err(HeaderError::UnbalancedComment { header: self.header });
        }
        if self.quoted {
            return Err(HeaderError::UnbalancedQuote { header: self.header });
        }
        self.end_segment();
        Ok(self.out)
    }
}
