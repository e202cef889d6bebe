#![warn(clippy::pedantic)]

pub mod boundary;
pub mod error;
pub mod line;
pub mod ring;

pub use boundary::{BoundaryKind, BoundaryMatch, BoundaryScanner, ScanOutcome};
pub use error::WireError;
pub use ring::RingReader;
