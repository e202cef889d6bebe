#![warn(clippy::pedantic)]

pub mod config;
pub mod content_type;
pub mod decoder;
pub mod error;
pub mod form;
pub mod part;

mod header_block;

pub use config::DecoderConfig;
pub use content_type::{boundary_from_content_type, boundary_from_headers};
pub use decoder::PartDecoder;
pub use encoding_rs;
pub use error::DecodeError;
pub use form::{Form, FormLimits, FormPart};
pub use part::Part;
