use std::fmt;

use crate::error::HeaderError;
use crate::params::ParsedHeaderValue;
use crate::tokenizer::{self, Commas};

/// Canonical spelling of a header name: first character upper-case, the
/// rest lower-case (`content-TYPE` → `Content-type`).
pub fn canonical_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars();
    if let Some(first) = chars.next() {
        out.push(first.to_ascii_uppercase());
    }
    out.extend(chars.map(|c| c.to_ascii_lowercase()));
    out
}

/// Case-insensitive, insertion-ordered multimap of header names to values.
///
/// Names are stored in [`canonical_name`] form and compared
/// case-insensitively. Iteration follows the order in which each name was
/// first inserted; repeated headers keep their values in arrival order.
///
/// ```text
/// Content-Disposition: form-data; name="f"
/// X-Tag: a
/// x-tag: b
///
///   "Content-disposition" → ["form-data; name=\"f\""]
///   "X-tag"               → ["a", "b"]
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<(String, Vec<String>)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(key, _)| key.eq_ignore_ascii_case(name))
    }

    /// All values of `name`, in arrival order.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.position(name).map(|i| self.entries[i].1.as_slice())
    }

    pub fn get_first(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Replace every value of `name` with `value`.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.put(name, vec![value.into()]);
    }

    /// Append `value` to `name`, creating the entry if needed.
    pub fn add(&mut self, name: &str, value: impl Into<String>) {
        match self.position(name) {
            Some(i) => self.entries[i].1.push(value.into()),
            None => self
                .entries
                .push((canonical_name(name), vec![value.into()])),
        }
    }

    /// Replace the whole value list of `name`, returning the previous one.
    pub fn put(&mut self, name: &str, values: Vec<String>) -> Option<Vec<String>> {
        match self.position(name) {
            Some(i) => Some(std::mem::replace(&mut self.entries[i].1, values)),
            None => {
                self.entries.push((canonical_name(name), values));
                None
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        self.position(name).map(|i| self.entries.remove(i).1)
    }

    /// `(canonical name, values)` pairs in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Tokenize the first comma-delimited value of the first `name` header.
    ///
    /// The value is trimmed and stripped of trailing `;` first. A missing or
    /// blank header gives `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Propagates tokenizer errors ([`HeaderError::UnbalancedQuote`],
    /// [`HeaderError::UnbalancedComment`]).
    pub fn parse_first(
        &self,
        name: &str,
        commas: Commas,
    ) -> Result<Option<ParsedHeaderValue>, HeaderError> {
        let Some(raw) = self.get_first(name).map(strip) else {
            return Ok(None);
        };
        if raw.is_empty() {
            return Ok(None);
        }
        tokenizer::parse(name, raw, commas).map(Some)
    }

    /// Tokenize every comma-delimited value of every `name` header.
    ///
    /// # Errors
    ///
    /// Stops at the first value that fails to tokenize.
    pub fn parse_all(
        &self,
        name: &str,
        commas: Commas,
    ) -> Result<Vec<ParsedHeaderValue>, HeaderError> {
        let mut out = Vec::new();
        for raw in self.get(name).unwrap_or_default() {
            let raw = strip(raw);
            if !raw.is_empty() {
                out.extend(tokenizer::parse_all(name, raw, commas)?);
            }
        }
        Ok(out)
    }
}

fn strip(raw: &str) -> &str {
    raw.trim().trim_end_matches(';')
}

impl<N: AsRef<str>, V: Into<String>> Extend<(N, V)> for HeaderMap {
    fn extend<I: IntoIterator<Item = (N, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.add(name.as_ref(), value);
        }
    }
}

impl<N: AsRef<str>, V: Into<String>> FromIterator<(N, V)> for HeaderMap {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

/// One `Name: value` line per value, in map order.
impl fmt::Display for HeaderMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, values) in self.iter() {
            for value in values {
                writeln!(f, "{name}: {value}")?;
            }
        }
        Ok(())
    }
}
