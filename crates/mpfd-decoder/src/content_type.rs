use mpfd_headers::{Commas, HeaderMap, tokenizer};

use crate::error::DecodeError;

/// Extract the boundary from a request `Content-Type` value.
///
/// ```
/// let b = mpfd_decoder::boundary_from_content_type(
///     r#"multipart/form-data; boundary="----WebKitFormBoundaryx7""#,
/// )?;
/// assert_eq!(b, "----WebKitFormBoundaryx7");
/// # Ok::<(), mpfd_decoder::DecodeError>(())
/// ```
///
/// # Errors
///
/// - [`DecodeError::NotMultipart`] when the media type is not
///   `multipart/form-data` (compared case-insensitively).
/// - [`DecodeError::MissingBoundary`] when `boundary` is absent or empty.
/// - [`DecodeError::Header`] when the value does not tokenize.
pub fn boundary_from_content_type(value: &str) -> Result<String, DecodeError> {
    let raw = value.trim().trim_end_matches(';');
    let parsed = tokenizer::parse("content-type", raw, Commas::Literal)?;
    let media_type = parsed.primary("content-type").unwrap_or_default();
    if !media_type.eq_ignore_ascii_case("multipart/form-data") {
        return Err(DecodeError::NotMultipart {
            media_type: media_type.to_owned(),
        });
    }
    match parsed.get("boundary") {
        Some(boundary) if !boundary.is_empty() => Ok(boundary.to_owned()),
        _ => Err(DecodeError::MissingBoundary),
    }
}

/// Extract the boundary from the `Content-Type` entry of request headers.
///
/// # Errors
///
/// As [`boundary_from_content_type`]; a missing header is
/// [`DecodeError::NotMultipart`] with an empty media type.
pub fn boundary_from_headers(headers: &HeaderMap) -> Result<String, DecodeError> {
    boundary_from_content_type(headers.get_first("content-type").unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_and_bare_boundaries() {
        assert_eq!(
            boundary_from_content_type("multipart/form-data; boundary=abc123").unwrap(),
            "abc123"
        );
        assert_eq!(
            boundary_from_content_type("Multipart/Form-Data; charset=utf-8; boundary=\"a;b c\";").unwrap(),
            "a;b c"
        );
    }

    #[test]
    fn other_media_types_are_rejected() {
        assert!(matches!(
            boundary_from_content_type("multipart/mixed; boundary=x"),
            Err(DecodeError::NotMultipart { media_type }) if media_type == "multipart/mixed"
        ));
        assert!(matches!(
            boundary_from_content_type("application/json"),
            Err(DecodeError::NotMultipart { .. })
        ));
    }

    #[test]
    fn missing_or_empty_boundary() {
        assert!(matches!(
            boundary_from_content_type("multipart/form-data"),
            Err(DecodeError::MissingBoundary)
        ));
        assert!(matches!(
            boundary_from_content_type("multipart/form-data; boundary=\"\""),
            Err(DecodeError::MissingBoundary)
        ));
    }

    #[test]
    fn from_header_map() {
        let headers: HeaderMap = [("CONTENT-TYPE", "multipart/form-data; boundary=zz")]
            .into_iter()
            .collect();
        assert_eq!(boundary_from_headers(&headers).unwrap(), "zz");
        assert!(matches!(
            boundary_from_headers(&HeaderMap::new()),
            Err(DecodeError::NotMultipart { .. })
        ));
    }
}
