/// Errors that can occur while building a `multipart/form-data` body.
///
/// Error hierarchy:
///
/// ```text
///   EncodeError
///   ├── EmptyForm            ← no parts and no headerless form requested
///   ├── InvalidBoundary      ← empty or CR/LF-bearing boundary
///   ├── BoundaryInBody       ← a part body contains the delimiter
///   ├── InvalidName          ← name, filename or header with CR/LF
///   ├── InvalidHeaderTarget  ← with_header called before any part
///   └── Io(std::io::Error)   ← from write_to
/// ```
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("no parts have been added to the encoder")]
    EmptyForm,

    #[error("invalid boundary {boundary:?}: must be non-empty and free of CR/LF")]
    InvalidBoundary { boundary: String },

    /// The body would be cut short by a decoder.
    #[error("body of part {index} contains the boundary delimiter")]
    BoundaryInBody { index: usize },

    #[error("{what} {value:?} contains CR or LF")]
    InvalidName { what: &'static str, value: String },

    #[error("with_header called but no parts have been added yet")]
    InvalidHeaderTarget,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
