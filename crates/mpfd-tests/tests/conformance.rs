//! Conformance tests: fixed bodies decoded and rendered to insta snapshots.
//!
//! Each test decodes a body with [`decode_all`] and renders the part listing
//! with [`render`]: index, name, filename, effective charset, every header
//! in canonical form, and the body decoded with the part's charset. The
//! snapshots are inline, so a diff shows up directly in this file (accept via
//! `cargo insta review`).

use mpfd_decoder::{DecoderConfig, PartDecoder};
use mpfd_encoder::FormEncoder;
use mpfd_tests::{SCENARIO_BODY, decode_all, render};
use insta::assert_snapshot;

fn listing(body: &[u8], boundary: &str) -> String {
    let parts = decode_all(body, boundary, DecoderConfig::default())
        .unwrap_or_else(|e| panic!("decode failed: {e}"));
    render(&parts)
}

#[test]
fn scenario_listing() {
    assert_snapshot!(listing(SCENARIO_BODY, "XYZ"), @r#"
    #0 name=Some("field1") filename=None charset=UTF-8
      Content-disposition: form-data; name="field1"
      body: "hello"
    #1 name=Some("file") filename=Some("report.txt") charset=UTF-8
      Content-disposition: form-data; name="file"; filename="report.txt"
      Content-type: text/plain
      body: "data"
    "#);
}

#[test]
fn folded_and_repeated_headers() {
    let body = b"--XYZ\r\n\
Content-Disposition: form-data;\r\n \
name=\"folded\"\r\n\
X-Trace: a\r\n\
x-TRACE: b\r\n\
\r\n\
one\r\n\
--XYZ--\r\n";
    assert_snapshot!(listing(body, "XYZ"), @r#"
    #0 name=Some("folded") filename=None charset=UTF-8
      Content-disposition: form-data; name="folded"
      X-trace: a
      X-trace: b
      body: "one"
    "#);
}

#[test]
fn charsets() {
    let body = FormEncoder::new()
        .with_boundary("XYZ")
        .add_field_with_charset("latin", b"caf\xe9", "iso-8859-1")
        .add_field_with_charset("unknown", b"plain", "x-no-such-charset")
        .add_file("blob", "b.bin", "application/octet-stream", b"raw")
        .encode()
        .unwrap();
    assert_snapshot!(listing(&body, "XYZ"), @r#"
    #0 name=Some("latin") filename=None charset=windows-1252
      Content-disposition: form-data; name="latin"
      Content-type: text/plain; charset=iso-8859-1
      body: "café"
    #1 name=Some("unknown") filename=None charset=UTF-8
      Content-disposition: form-data; name="unknown"
      Content-type: text/plain; charset=x-no-such-charset
      body: "plain"
    #2 name=Some("blob") filename=Some("b.bin") charset=UTF-8
      Content-disposition: form-data; name="blob"; filename="b.bin"
      Content-type: application/octet-stream
      body: "raw"
    "#);
}

#[test]
fn comments_and_escapes_in_disposition() {
    let body = b"--XYZ\r\n\
Content-Disposition: form-data (upload); name=\"a\\\"b\"; filename=\"x (1).txt\"\r\n\
\r\n\
body\r\n\
--XYZ--\r\n";
    assert_snapshot!(listing(body, "XYZ"), @r#"
    #0 name=Some("a\"b") filename=Some("x (1).txt") charset=UTF-8
      Content-disposition: form-data (upload); name="a\"b"; filename="x (1).txt"
      body: "body"
    "#);
}

#[test]
fn default_charset_applies_to_text_plain_only() {
    let body = b"--XYZ\r\n\
Content-Disposition: form-data; name=\"t\"\r\n\
Content-Type: text/plain\r\n\
\r\n\
caf\xe9\r\n\
--XYZ\r\n\
Content-Disposition: form-data; name=\"j\"\r\n\
Content-Type: application/json\r\n\
\r\n\
{}\r\n\
--XYZ--\r\n";
    let mut decoder = PartDecoder::new(body.as_slice(), "XYZ").unwrap();
    decoder.set_default_charset(mpfd_decoder::encoding_rs::WINDOWS_1252);
    let mut lines = Vec::new();
    while let Some(mut part) = decoder.next_part().unwrap() {
        let name = part.name().unwrap_or_default().to_owned();
        let charset = part.charset().name();
        let text = part.read_to_text().unwrap();
        lines.push(format!("{name} {charset} {text:?}"));
    }
    assert_snapshot!(lines.join("\n"), @r#"
    t windows-1252 "café"
    j UTF-8 "{}"
    "#);
}
