use thiserror::Error as ThisError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Parse,
    NotFound,
    InvalidArgument,
    InvalidInput,
    InvalidState,
    UnsupportedQuery,
    /// Row index past the end of a column or region.
    Bounds,
    /// Read or write past the space currently backed by the file.
    StorageBounds,
    UniquenessViolation,
    TypeMismatch,
    CapacityExceeded,
}

#[derive(Debug, ThisError)]
#[error("{kind:?}: {context}")]
pub struct Error {
    pub kind: ErrorKind,
    pub context: String,
}

impl Error {
    pub fn new(kind: ErrorKind, context: String) -> Self {
        Error { kind, context }
    }

    pub fn bounds(index: u64, len: u64) -> Self {
        Error::new(ErrorKind::Bounds, format!("index {} out of range for length {}", index, len))
    }

    pub fn type_mismatch(expected: &str, actual: impl std::fmt::Debug) -> Self {
        Error::new(ErrorKind::TypeMismatch, format!("expected {}, actual: {:?}", expected, actual))
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error {
            kind: ErrorKind::Io,
            context: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
