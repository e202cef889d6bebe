use std::borrow::Cow;
use std::io::Read;

use encoding_rs::Encoding;
use mpfd_headers::HeaderMap;

use crate::decoder::PartDecoder;
use crate::error::DecodeError;

/// Default maximum number of parts in one form.
pub const DEFAULT_MAX_PARTS: usize = 100;

/// Default maximum size of a single part body (10 MiB).
pub const DEFAULT_MAX_PART_SIZE: u64 = 10 * 1024 * 1024;

/// Default maximum size of all part bodies together (50 MiB).
pub const DEFAULT_MAX_TOTAL_SIZE: u64 = 50 * 1024 * 1024;

/// Name of the HTML field that announces the form's charset.
pub const CHARSET_FIELD: &str = "_charset_";

/// Size limits applied by [`Form::collect`].
#[derive(Clone, Debug)]
pub struct FormLimits {
    max_parts: usize,
    max_part_size: u64,
    max_total_size: u64,
}

impl Default for FormLimits {
    fn default() -> Self {
        Self {
            max_parts: DEFAULT_MAX_PARTS,
            max_part_size: DEFAULT_MAX_PART_SIZE,
            max_total_size: DEFAULT_MAX_TOTAL_SIZE,
        }
    }
}

impl FormLimits {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn max_parts(mut self, count: usize) -> Self {
        self.max_parts = count;
        self
    }

    #[must_use]
    pub fn max_part_size(mut self, bytes: u64) -> Self {
        self.max_part_size = bytes;
        self
    }

    #[must_use]
    pub fn max_total_size(mut self, bytes: u64) -> Self {
        self.max_total_size = bytes;
        self
    }

    #[must_use]
    pub fn get_max_parts(&self) -> usize {
        self.max_parts
    }

    #[must_use]
    pub fn get_max_part_size(&self) -> u64 {
        self.max_part_size
    }

    #[must_use]
    pub fn get_max_total_size(&self) -> u64 {
        self.max_total_size
    }
}

/// A fully buffered part.
#[derive(Clone, Debug)]
pub struct FormPart {
    index: usize,
    name: Option<String>,
    filename: Option<String>,
    content_type: Option<String>,
    charset: &'static Encoding,
    headers: HeaderMap,
    data: Vec<u8>,
}

impl FormPart {
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    #[must_use]
    pub fn charset(&self) -> &'static Encoding {
        self.charset
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_file(&self) -> bool {
        self.filename.is_some()
    }

    /// The body decoded with the part's charset.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        self.charset.decode_without_bom_handling(&self.data).0
    }
}

/// Every part of a body, buffered in memory.
///
/// Fields are parts without a `filename`; files are parts with one.
#[derive(Clone, Debug, Default)]
pub struct Form {
    parts: Vec<FormPart>,
}

impl Form {
    /// Read every remaining part of `decoder` into memory.
    ///
    /// A field named `_charset_` changes the decoder's default charset for
    /// the `text/plain` parts that follow it.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::LimitExceeded`] when a [`FormLimits`] bound is hit.
    /// - Any error from the decoder itself.
    pub fn collect<R: Read>(
        decoder: &mut PartDecoder<R>,
        limits: &FormLimits,
    ) -> Result<Self, DecodeError> {
        let mut parts = Vec::new();
        let mut total: u64 = 0;
        let mut chunk = vec![0u8; 8 * 1024];

        loop {
            let Some(mut part) = decoder.next_part()? else {
                break;
            };
            if parts.len() >= limits.max_parts {
                drop(part);
                decoder.fail();
                return Err(DecodeError::LimitExceeded {
                    what: "part count",
                    limit: limits.max_parts as u64,
                });
            }

            let mut data = Vec::new();
            loop {
                let n = part.read_chunk(&mut chunk)?;
                if n == 0 {
                    break;
                }
                if (data.len() + n) as u64 > limits.max_part_size {
                    drop(part);
                    decoder.fail();
                    return Err(DecodeError::LimitExceeded {
                        what: "part size",
                        limit: limits.max_part_size,
                    });
                }
                total += n as u64;
                if total > limits.max_total_size {
                    drop(part);
                    decoder.fail();
                    return Err(DecodeError::LimitExceeded {
                        what: "form size",
                        limit: limits.max_total_size,
                    });
                }
                data.extend_from_slice(&chunk[..n]);
            }

            let form_part = FormPart {
                index: part.index(),
                name: part.name().map(str::to_owned),
                filename: part.filename().map(str::to_owned),
                content_type: part.content_type().map(str::to_owned),
                charset: part.charset(),
                headers: part.headers().clone(),
                data,
            };
            drop(part);

            if form_part.name() == Some(CHARSET_FIELD) && !form_part.is_file() {
                let label = String::from_utf8_lossy(&form_part.data);
                if let Some(charset) = Encoding::for_label(label.trim().as_bytes()) {
                    tracing::debug!(charset = charset.name(), "form default charset set by _charset_");
                    decoder.set_default_charset(charset);
                }
            }
            parts.push(form_part);
        }
        Ok(Self { parts })
    }

    #[must_use]
    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    pub fn fields(&self) -> impl Iterator<Item = &FormPart> {
        self.parts.iter().filter(|p| !p.is_file())
    }

    pub fn files(&self) -> impl Iterator<Item = &FormPart> {
        self.parts.iter().filter(|p| p.is_file())
    }

    /// First field named `name`.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FormPart> {
        self.fields().find(|p| p.name() == Some(name))
    }

    /// First file part named `name`.
    #[must_use]
    pub fn file(&self, name: &str) -> Option<&FormPart> {
        self.files().find(|p| p.name() == Some(name))
    }

    /// Every part named `name`, in body order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FormPart> {
        self.parts.iter().filter(move |p| p.name() == Some(name))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    #[must_use]
    pub fn into_parts(self) -> Vec<FormPart> {
        self.parts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpfd_encoder::FormEncoder;

    fn collect(body: &[u8], boundary: &str, limits: &FormLimits) -> Result<Form, DecodeError> {
        let mut decoder = PartDecoder::new(body, boundary)?;
        Form::collect(&mut decoder, limits)
    }

    #[test]
    fn splits_fields_and_files() {
        let mut enc = FormEncoder::new();
        enc.add_field("title", "Quarterly")
            .add_file("doc", "q3.pdf", "application/pdf", b"%PDF-1.7")
            .add_field("tag", "a")
            .add_field("tag", "b");
        let body = enc.encode().unwrap();

        let form = collect(&body, enc.boundary(), &FormLimits::default()).unwrap();
        assert_eq!(form.len(), 4);
        assert_eq!(form.fields().count(), 3);
        assert_eq!(form.field("title").unwrap().text(), "Quarterly");
        let doc = form.file("doc").unwrap();
        assert_eq!(doc.filename(), Some("q3.pdf"));
        assert_eq!(doc.content_type(), Some("application/pdf"));
        assert_eq!(doc.data(), b"%PDF-1.7");
        let tags: Vec<_> = form.get_all("tag").map(|p| p.text().into_owned()).collect();
        assert_eq!(tags, vec!["a", "b"]);
        assert!(form.file("title").is_none());
    }

    #[test]
    fn charset_field_sets_default() {
        let mut enc = FormEncoder::new();
        enc.add_field(CHARSET_FIELD, "windows-1252")
            .add_field_bytes("greeting", &[b'o', b'l', 0xE9])
            .with_header("Content-Type", "text/plain")
            .add_field("plain", "x");
        let body = enc.encode().unwrap();

        let form = collect(&body, enc.boundary(), &FormLimits::default()).unwrap();
        let greeting = form.field("greeting").unwrap();
        assert_eq!(greeting.charset(), encoding_rs::WINDOWS_1252);
        assert_eq!(greeting.text(), "olé");
        // No Content-Type at all: always UTF-8.
        assert_eq!(form.field("plain").unwrap().charset(), encoding_rs::UTF_8);
    }

    #[test]
    fn part_count_limit() {
        let mut enc = FormEncoder::new();
        enc.add_field("a", "1").add_field("b", "2").add_field("c", "3");
        let body = enc.encode().unwrap();
        let err = collect(&body, enc.boundary(), &FormLimits::new().max_parts(2)).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::LimitExceeded { what: "part count", limit: 2 }
        ));
    }

    #[test]
    fn part_size_limit() {
        let mut enc = FormEncoder::new();
        enc.add_file("f", "big.bin", "application/octet-stream", &[0u8; 4096]);
        let body = enc.encode().unwrap();
        let err = collect(&body, enc.boundary(), &FormLimits::new().max_part_size(4095)).unwrap_err();
        assert!(matches!(err, DecodeError::LimitExceeded { what: "part size", .. }));
        assert!(collect(&body, enc.boundary(), &FormLimits::new().max_part_size(4096)).is_ok());
    }

    #[test]
    fn total_size_limit() {
        let mut enc = FormEncoder::new();
        enc.add_field("a", "12345").add_field("b", "67890");
        let body = enc.encode().unwrap();
        let err = collect(&body, enc.boundary(), &FormLimits::new().max_total_size(9)).unwrap_err();
        assert!(matches!(err, DecodeError::LimitExceeded { what: "form size", limit: 9 }));
    }

    #[test]
    fn limits_accessors() {
        let limits = FormLimits::default();
        assert_eq!(limits.get_max_parts(), DEFAULT_MAX_PARTS);
        assert_eq!(limits.get_max_part_size(), DEFAULT_MAX_PART_SIZE);
        assert_eq!(limits.get_max_total_size(), DEFAULT_MAX_TOTAL_SIZE);
    }
}
