use std::fmt;
use std::panic::Location;

use thiserror::Error;

/// Source location attached to an error for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorLocation {
    pub file: &'static str,
    pub line: u32,
}

impl ErrorLocation {
    /// Location of the caller of the function that builds the error.
    #[track_caller]
    pub fn here() -> Self {
        let caller = Location::caller();
        Self {
            file: caller.file(),
            line: caller.line(),
        }
    }
}

impl fmt::Display for ErrorLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Stable error category for codec failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackStreamErrorKind {
    Generic,
    NotPackable,
    NotEnoughBytes,
    IncorrectValue,
    UnexpectedByteMarker,
    IncorrectNumberOfFields,
    TypeMismatch,
    SignatureMismatch,
    OutOfBoundary,
    UnsupportedType,
    ConnectionClosed,
    External,
}

impl fmt::Display for PackStreamErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            PackStreamErrorKind::Generic => "Generic error.",
            PackStreamErrorKind::NotPackable => "The value cannot be packed.",
            PackStreamErrorKind::NotEnoughBytes => "Not enough bytes to proceed.",
            PackStreamErrorKind::IncorrectValue => "The value is incorrect.",
            PackStreamErrorKind::UnexpectedByteMarker => "The byte marker is unrecognized.",
            PackStreamErrorKind::IncorrectNumberOfFields => "The number of fields is incorrect.",
            PackStreamErrorKind::TypeMismatch => "Incorrect type.",
            PackStreamErrorKind::SignatureMismatch => {
                "The structure signature has the wrong tag byte."
            }
            PackStreamErrorKind::OutOfBoundary => "Out of boundary.",
            PackStreamErrorKind::UnsupportedType => "The type is unsupported.",
            PackStreamErrorKind::ConnectionClosed => "The connection has been closed.",
            PackStreamErrorKind::External => "An error occurred outside the codec.",
        };
        f.write_str(text)
    }
}

/// Error raised while encoding or decoding PackStream values.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind}{} at {location}", format_detail(.detail))]
pub struct PackStreamError {
    kind: PackStreamErrorKind,
    detail: Option<String>,
    location: ErrorLocation,
}

pub type PackStreamResult<T> = Result<T, PackStreamError>;

pub(crate) fn format_detail(detail: &Option<String>) -> String {
    match detail {
        Some(detail) => format!(" {}", detail),
        None => String::new(),
    }
}

impl PackStreamError {
    #[track_caller]
    pub fn new(kind: PackStreamErrorKind) -> Self {
        Self {
            kind,
            detail: None,
            location: ErrorLocation::here(),
        }
    }

    #[track_caller]
    pub fn with_detail(kind: PackStreamErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: Some(detail.into()),
            location: ErrorLocation::here(),
        }
    }

    /// "Expected X, found Y." detail.
    #[track_caller]
    pub fn expectation(
        kind: PackStreamErrorKind,
        expected: impl fmt::Display,
        found: impl fmt::Display,
    ) -> Self {
        Self::with_detail(kind, format!("Expected {}, found {}.", expected, found))
    }

    #[track_caller]
    pub fn external(error: impl fmt::Display) -> Self {
        Self::with_detail(PackStreamErrorKind::External, error.to_string())
    }

    pub fn kind(&self) -> PackStreamErrorKind {
        self.kind
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn location(&self) -> ErrorLocation {
        self.location
    }
}

impl serde::ser::Error for PackStreamError {
    #[track_caller]
    fn custom<T: fmt::Display>(msg: T) -> Self {
        PackStreamError::with_detail(PackStreamErrorKind::NotPackable, msg.to_string())
    }
}

impl serde::de::Error for PackStreamError {
    #[track_caller]
    fn custom<T: fmt::Display>(msg: T) -> Self {
        PackStreamError::with_detail(PackStreamErrorKind::TypeMismatch, msg.to_string())
    }
}
