use std::fmt;

/// The result of tokenizing one header value.
///
/// An ordered map from lower-cased parameter name to value. Flag parameters
/// (`; secure`) map to `None`. The header's bare value is stored under the
/// header's own lower-cased name:
///
/// ```text
/// Content-Type: text/plain; charset=utf-8; flowed
///
///   content-type → Some("text/plain")
///   charset      → Some("utf-8")
///   flowed       → None
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedHeaderValue {
    entries: Vec<(String, Option<String>)>,
}

impl ParsedHeaderValue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a parameter. A repeated key replaces the earlier value but
    /// keeps its position.
    pub(crate) fn insert(&mut self, key: String, value: Option<String>) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Value of `key`. Flags and missing keys both read as `None`; use
    /// [`value`](Self::value) to tell them apart.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.value(key).flatten()
    }

    /// `Some(None)` for a flag, `Some(Some(v))` for a valued parameter.
    pub fn value(&self, key: &str) -> Option<Option<&str>> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_deref())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.value(key).is_some()
    }

    /// The bare value of header `name`, e.g. the media type of a
    /// `Content-Type` value.
    pub fn primary(&self, name: &str) -> Option<&str> {
        self.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for ParsedHeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            match value {
                Some(v) => write!(f, "{key}={v:?}")?,
                None => f.write_str(key)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_value_wins_in_first_position() {
        let mut p = ParsedHeaderValue::new();
        p.insert("a".into(), Some("1".into()));
        p.insert("b".into(), None);
        p.insert("a".into(), Some("2".into()));
        let items: Vec<_> = p.iter().collect();
        assert_eq!(items, vec![("a", Some("2")), ("b", None)]);
    }

    #[test]
    fn flag_versus_missing() {
        let mut p = ParsedHeaderValue::new();
        p.insert("secure".into(), None);
        assert_eq!(p.value("secure"), Some(None));
        assert_eq!(p.value("other"), None);
        assert!(p.contains_key("SECURE"));
        assert_eq!(p.get("secure"), None);
    }

    #[test]
    fn display_quotes_values() {
        let mut p = ParsedHeaderValue::new();
        p.insert("content-type".into(), Some("text/plain".into()));
        p.insert("flowed".into(), None);
        assert_eq!(p.to_string(), r#"content-type="text/plain"; flowed"#);
    }
}
