//! The `XYZ` example end to end: boundary `XYZ`, a text field `field1` with
//! `hello` and a file `file` named `report.txt` containing `data`.

use std::io::Read;

use mpfd_decoder::{Form, FormLimits, PartDecoder, boundary_from_content_type};
use mpfd_encoder::FormEncoder;
use mpfd_tests::SCENARIO_BODY;

#[test]
fn encoder_produces_the_scenario_body() {
    let body = FormEncoder::new()
        .with_boundary("XYZ")
        .add_field("field1", "hello")
        .add_file("file", "report.txt", "text/plain", b"data")
        .encode()
        .unwrap();
    assert_eq!(body, SCENARIO_BODY);
}

#[test]
fn streaming_decode() {
    let mut decoder = PartDecoder::new(SCENARIO_BODY, "XYZ").unwrap();
    assert!(decoder.has_next().unwrap());

    let mut first = decoder.next_part().unwrap().expect("first part");
    assert_eq!(first.index(), 0);
    assert_eq!(first.name(), Some("field1"));
    assert_eq!(first.filename(), None);
    assert!(!first.is_file());
    let mut text = String::new();
    first.read_to_string(&mut text).unwrap();
    assert_eq!(text, "hello");
    assert!(first.is_finished());

    let mut second = decoder.next_part().unwrap().expect("second part");
    assert_eq!(second.index(), 1);
    assert_eq!(second.name(), Some("file"));
    assert_eq!(second.filename(), Some("report.txt"));
    assert_eq!(second.media_type(), Some("text/plain"));
    assert!(second.is_file());
    assert_eq!(second.read_to_text().unwrap(), "data");

    assert!(decoder.next_part().unwrap().is_none());
    assert!(decoder.is_done());
    assert_eq!(decoder.parts_seen(), 2);
    assert_eq!(decoder.position(), SCENARIO_BODY.len() as u64);
}

#[test]
fn boundary_from_request_header() {
    let boundary = boundary_from_content_type("multipart/form-data; boundary=XYZ").unwrap();
    let mut decoder = PartDecoder::new(SCENARIO_BODY, &boundary).unwrap();
    let mut count = 0;
    while let Some(mut part) = decoder.next_part().unwrap() {
        part.close().unwrap();
        count += 1;
    }
    assert_eq!(count, 2);
}

#[test]
fn collected_form() {
    let mut decoder = PartDecoder::new(SCENARIO_BODY, "XYZ").unwrap();
    let form = Form::collect(&mut decoder, &FormLimits::default()).unwrap();

    assert_eq!(form.len(), 2);
    assert_eq!(form.field("field1").unwrap().text(), "hello");
    let file = form.file("file").unwrap();
    assert_eq!(file.filename(), Some("report.txt"));
    assert_eq!(file.data(), b"data");
    assert_eq!(form.fields().count(), 1);
    assert_eq!(form.files().count(), 1);
}
