#![warn(clippy::pedantic)]

pub mod error;
pub mod header_map;
pub mod params;
pub mod tokenizer;

pub use error::HeaderError;
pub use header_map::{HeaderMap, canonical_name};
pub use params::ParsedHeaderValue;
pub use tokenizer::Commas;
