use std::io::Write;

use crate::error::EncodeError;

/// Boundary used by [`FormEncoder::new`].
pub const DEFAULT_BOUNDARY: &str = "----mpfdFormBoundary7MA4YWxkTrZu0gW";

/// Builder for `multipart/form-data` bodies.
///
/// Parts are appended with the `add_*` methods; [`with_header`](Self::with_header)
/// acts on the most recently added part. Nothing is serialized until
/// [`encode`](Self::encode) or [`write_to`](Self::write_to), which validate
/// the whole form first.
///
/// ```text
///   --boundary CRLF
///   Content-Disposition: form-data; name="..."[; filename="..."] CRLF
///   [Content-Type: ... CRLF]
///   [extra headers CRLF]
///   CRLF
///   body CRLF
///   ... repeated ...
///   --boundary-- CRLF
/// ```
///
/// # Example
///
/// ```
/// use mpfd_encoder::FormEncoder;
///
/// let body = FormEncoder::new()
///     .with_boundary("XYZ")
///     .add_field("field1", "hello")
///     .add_file("file", "report.txt", "text/plain", b"data")
///     .encode()?;
/// assert!(body.starts_with(b"--XYZ\r\n"));
/// assert!(body.ends_with(b"\r\n--XYZ--\r\n"));
/// # Ok::<(), mpfd_encoder::EncodeError>(())
/// ```
#[derive(Clone, Debug)]
pub struct FormEncoder {
    boundary: String,
    parts: Vec<PendingPart>,
    headerless: bool,
    orphan_header: bool,
}

#[derive(Clone, Debug)]
struct PendingPart {
    name: String,
    filename: Option<String>,
    content_type: Option<String>,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl FormEncoder {
    pub fn new() -> Self {
        Self {
            boundary: DEFAULT_BOUNDARY.to_owned(),
            parts: Vec::new(),
            headerless: false,
            orphan_header: false,
        }
    }

    pub fn with_boundary(&mut self, boundary: &str) -> &mut Self {
        boundary.clone_into(&mut self.boundary);
        self
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// The request `Content-Type` value announcing this encoder's boundary.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", quote_if_needed(&self.boundary))
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    // ── Part builders ───────────────────────────────────────────────────

    /// Add a text field without a `Content-Type` header, as browsers send
    /// ordinary inputs.
    pub fn add_field(&mut self, name: &str, value: &str) -> &mut Self {
        self.add_field_bytes(name, value.as_bytes())
    }

    /// Add a field whose value is not necessarily UTF-8.
    pub fn add_field_bytes(&mut self, name: &str, value: &[u8]) -> &mut Self {
        self.push(name, None, None, value)
    }

    /// Add a `text/plain` field with an explicit `charset` parameter.
    pub fn add_field_with_charset(&mut self, name: &str, value: &[u8], charset: &str) -> &mut Self {
        let content_type = format!("text/plain; charset={}", quote_if_needed(charset));
        self.push(name, None, Some(content_type), value)
    }

    /// Add a file upload.
    pub fn add_file(
        &mut self,
        name: &str,
        filename: &str,
        content_type: &str,
        content: &[u8],
    ) -> &mut Self {
        self.push(
            name,
            Some(filename.to_owned()),
            Some(content_type.to_owned()),
            content,
        )
    }

    // ── Modifiers ───────────────────────────────────────────────────────

    /// Add an extra header line to the most recently added part.
    ///
    /// Without a preceding part, [`encode`](Self::encode) fails with
    /// [`EncodeError::InvalidHeaderTarget`].
    pub fn with_header(&mut self, name: &str, value: &str) -> &mut Self {
        match self.parts.last_mut() {
            Some(part) => part.headers.push((name.to_owned(), value.to_owned())),
            None => self.orphan_header = true,
        }
        self
    }

    /// Encode an empty form as the RFC 7578 headerless body
    /// (`--boundary CRLF CRLF--boundary-- CRLF`) instead of failing with
    /// [`EncodeError::EmptyForm`].
    pub fn headerless_empty(&mut self) -> &mut Self {
        self.headerless = true;
        self
    }

    // ── Output ──────────────────────────────────────────────────────────

    /// Serialize the form into a new buffer.
    ///
    /// # Errors
    ///
    /// - [`EncodeError::EmptyForm`] when no parts were added (unless
    ///   [`headerless_empty`](Self::headerless_empty) was requested).
    /// - [`EncodeError::InvalidBoundary`], [`EncodeError::InvalidName`],
    ///   [`EncodeError::BoundaryInBody`], [`EncodeError::InvalidHeaderTarget`]
    ///   from validation.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let estimated = self
            .parts
            .iter()
            .map(|p| p.body.len() + 2 * self.boundary.len() + 128)
            .sum::<usize>()
            + self.boundary.len()
            + 8;
        let mut output = Vec::with_capacity(estimated);
        self.write_to(&mut output)?;
        Ok(output)
    }

    /// Serialize the form into `out`.
    ///
    /// # Errors
    ///
    /// As [`encode`](Self::encode), plus [`EncodeError::Io`] from `out`.
    pub fn write_to<W: Write>(&self, mut out: W) -> Result<(), EncodeError> {
        self.validate()?;
        let boundary = self.boundary.as_bytes();

        if self.parts.is_empty() {
            // Only reachable with `headerless`.
            out.write_all(b"--")?;
            out.write_all(boundary)?;
            out.write_all(b"\r\n\r\n--")?;
            out.write_all(boundary)?;
            out.write_all(b"--\r\n")?;
            return Ok(());
        }

        for part in &self.parts {
            out.write_all(b"--")?;
            out.write_all(boundary)?;
            out.write_all(b"\r\n")?;
            write!(out, "Content-Disposition: form-data; name=\"{}\"", escape(&part.name))?;
            if let Some(filename) = &part.filename {
                write!(out, "; filename=\"{}\"", escape(filename))?;
            }
            out.write_all(b"\r\n")?;
            if let Some(content_type) = &part.content_type {
                write!(out, "Content-Type: {content_type}\r\n")?;
            }
            for (name, value) in &part.headers {
                write!(out, "{name}: {value}\r\n")?;
            }
            out.write_all(b"\r\n")?;
            out.write_all(&part.body)?;
            out.write_all(b"\r\n")?;
        }
        out.write_all(b"--")?;
        out.write_all(boundary)?;
        out.write_all(b"--\r\n")?;
        Ok(())
    }

    // ── Internal helpers ────────────────────────────────────────────────

    fn push(
        &mut self,
        name: &str,
        filename: Option<String>,
        content_type: Option<String>,
        body: &[u8],
    ) -> &mut Self {
        self.parts.push(PendingPart {
            name: name.to_owned(),
            filename,
            content_type,
            headers: Vec::new(),
            body: body.to_vec(),
        });
        self
    }

    fn validate(&self) -> Result<(), EncodeError> {
        if self.boundary.is_empty() || has_line_break(&self.boundary) {
            return Err(EncodeError::InvalidBoundary {
                boundary: self.boundary.clone(),
            });
        }
        if self.orphan_header {
            return Err(EncodeError::InvalidHeaderTarget);
        }
        if self.parts.is_empty() && !self.headerless {
            return Err(EncodeError::EmptyForm);
        }

        let mut delimiter = b"\r\n--".to_vec();
        delimiter.extend_from_slice(self.boundary.as_bytes());
        let finder = memchr::memmem::Finder::new(&delimiter);

        for (index, part) in self.parts.iter().enumerate() {
            check_line("name", &part.name)?;
            if let Some(filename) = &part.filename {
                check_line("filename", filename)?;
            }
            if let Some(content_type) = &part.content_type {
                check_line("content type", content_type)?;
            }
            for (name, value) in &part.headers {
                check_line("header", name)?;
                check_line("header value", value)?;
            }
            if finder.find(&part.body).is_some() {
                return Err(EncodeError::BoundaryInBody { index });
            }
        }
        Ok(())
    }
}

impl Default for FormEncoder {
    fn default() -> Self {
        Self::new()
    }
}

fn has_line_break(s: &str) -> bool {
    s.contains(['\r', '\n'])
}

fn check_line(what: &'static str, value: &str) -> Result<(), EncodeError> {
    if has_line_break(value) {
        return Err(EncodeError::InvalidName {
            what,
            value: value.to_owned(),
        });
    }
    Ok(())
}

/// Backslash-escape `"` and `\` for a quoted-string.
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch == '"' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Parameter values that are not RFC 2045 tokens are sent quoted.
fn quote_if_needed(value: &str) -> String {
    let token = !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b));
    if token {
        value.to_owned()
    } else {
        format!("\"{}\"", escape(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_fields_and_files() {
        let body = FormEncoder::new()
            .with_boundary("XYZ")
            .add_field("field1", "hello")
            .add_file("file", "report.txt", "text/plain", b"data")
            .encode()
            .unwrap();
        let expected = "--XYZ\r\n\
            Content-Disposition: form-data; name=\"field1\"\r\n\
            \r\n\
            hello\r\n\
            --XYZ\r\n\
            Content-Disposition: form-data; name=\"file\"; filename=\"report.txt\"\r\n\
            Content-Type: text/plain\r\n\
            \r\n\
            data\r\n\
            --XYZ--\r\n";
        assert_eq!(String::from_utf8(body).unwrap(), expected);
    }

    #[test]
    fn builder_methods_are_chainable() {
        let mut enc = FormEncoder::new();
        enc.add_field("a", "1")
            .with_header("X-Trace", "abc")
            .add_field_with_charset("b", b"2", "iso-8859-1");
        assert_eq!(enc.len(), 2);
        let text = String::from_utf8(enc.encode().unwrap()).unwrap();
        assert!(text.contains("X-Trace: abc\r\n"));
        assert!(text.contains("Content-Type: text/plain; charset=iso-8859-1\r\n"));
    }

    #[test]
    fn empty_encoder_is_an_error() {
        assert!(matches!(FormEncoder::new().encode(), Err(EncodeError::EmptyForm)));
    }

    #[test]
    fn headerless_empty_form() {
        let body = FormEncoder::new().with_boundary("XYZ").headerless_empty().encode().unwrap();
        assert_eq!(body, b"--XYZ\r\n\r\n--XYZ--\r\n");
    }

    #[test]
    fn header_without_part() {
        let mut enc = FormEncoder::new();
        enc.with_header("X-A", "1").add_field("a", "1");
        assert!(matches!(enc.encode(), Err(EncodeError::InvalidHeaderTarget)));
    }

    #[test]
    fn rejects_bad_boundaries() {
        for boundary in ["", "a\r\nb"] {
            let mut enc = FormEncoder::new();
            enc.with_boundary(boundary).add_field("a", "1");
            assert!(matches!(enc.encode(), Err(EncodeError::InvalidBoundary { .. })));
        }
    }

    #[test]
    fn rejects_delimiter_in_body() {
        let mut enc = FormEncoder::new();
        enc.with_boundary("XYZ")
            .add_field("ok", "--XYZ at the start is fine")
            .add_field("bad", "line\r\n--XYZ\r\nmore");
        assert!(matches!(enc.encode(), Err(EncodeError::BoundaryInBody { index: 1 })));
    }

    #[test]
    fn rejects_line_breaks_in_names() {
        let mut enc = FormEncoder::new();
        enc.add_file("f", "evil\r\nX-Injected: 1", "text/plain", b"");
        assert!(matches!(
            enc.encode(),
            Err(EncodeError::InvalidName { what: "filename", .. })
        ));
    }

    #[test]
    fn quotes_are_escaped() {
        let text = String::from_utf8(
            FormEncoder::new()
                .add_file("f", r#"say "hi"\.txt"#, "text/plain", b"x")
                .encode()
                .unwrap(),
        )
        .unwrap();
        assert!(text.contains(r#"filename="say \"hi\"\\.txt""#));
    }

    #[test]
    fn content_type_quotes_unusual_boundaries() {
        let mut enc = FormEncoder::new();
        assert_eq!(enc.content_type(), format!("multipart/form-data; boundary={DEFAULT_BOUNDARY}"));
        enc.with_boundary("a b;c");
        assert_eq!(enc.content_type(), r#"multipart/form-data; boundary="a b;c""#);
    }

    #[test]
    fn write_to_matches_encode() {
        let mut enc = FormEncoder::new();
        enc.add_field("a", "1").add_file("b", "b.bin", "application/octet-stream", &[0, 1, 2]);
        let mut written = Vec::new();
        enc.write_to(&mut written).unwrap();
        assert_eq!(written, enc.encode().unwrap());
    }

    #[test]
    fn default_impl_matches_new() {
        assert_eq!(FormEncoder::default().boundary(), FormEncoder::new().boundary());
    }
}
