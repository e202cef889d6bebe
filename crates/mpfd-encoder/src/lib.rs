#![warn(clippy::pedantic)]

pub mod encoder;
pub mod error;

pub use encoder::{DEFAULT_BOUNDARY, FormEncoder};
pub use error::EncodeError;
