use std::fmt;

use thiserror::Error;

use crate::packstream::error::format_detail;
use crate::packstream::{ErrorLocation, PackStreamError, PackStreamErrorKind};

/// Stable error category for protocol-level failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoltErrorKind {
    Generic,
    /// The transport is gone or the connection reached the defunct state.
    ConnectionClosed,
    /// The server sent a message that is not a valid response.
    NotValidResponse,
    /// The request is not allowed in the current server state.
    Forbidden,
    /// The server answered with a FAILURE summary.
    Failed { code: String, message: String },
    /// The server answered with an IGNORED summary.
    Ignored,
    /// Version negotiation did not produce a usable version.
    HandshakeFailed,
    /// Encoding or decoding a message failed.
    Codec(PackStreamErrorKind),
    Io,
}

impl fmt::Display for BoltErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoltErrorKind::Generic => f.write_str("Generic error."),
            BoltErrorKind::ConnectionClosed => f.write_str("The connection is closed."),
            BoltErrorKind::NotValidResponse => {
                f.write_str("The response sent from server is not valid.")
            }
            BoltErrorKind::Forbidden => {
                f.write_str("The operation is forbidden in the current state.")
            }
            BoltErrorKind::Failed { code, message } => write!(
                f,
                "The server has reported a failure outcome. code: {}, message: {}",
                code, message
            ),
            BoltErrorKind::Ignored => f.write_str("The server has ignored the request."),
            BoltErrorKind::HandshakeFailed => {
                f.write_str("Unable to negotiate a compatible Bolt version.")
            }
            BoltErrorKind::Codec(kind) => write!(f, "Codec error: {}", kind),
            BoltErrorKind::Io => f.write_str("I/O error."),
        }
    }
}

/// Error raised by the protocol engine.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind}{} at {location}", format_detail(.detail))]
pub struct BoltError {
    kind: BoltErrorKind,
    detail: Option<String>,
    location: ErrorLocation,
}

pub type BoltResult<T> = Result<T, BoltError>;

impl BoltError {
    #[track_caller]
    pub fn new(kind: BoltErrorKind) -> Self {
        Self {
            kind,
            detail: None,
            location: ErrorLocation::here(),
        }
    }

    #[track_caller]
    pub fn with_detail(kind: BoltErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: Some(detail.into()),
            location: ErrorLocation::here(),
        }
    }

    #[track_caller]
    pub fn connection_closed(detail: impl Into<String>) -> Self {
        Self::with_detail(BoltErrorKind::ConnectionClosed, detail)
    }

    pub fn kind(&self) -> &BoltErrorKind {
        &self.kind
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn location(&self) -> ErrorLocation {
        self.location
    }

    pub fn is_connection_closed(&self) -> bool {
        self.kind == BoltErrorKind::ConnectionClosed
    }

    pub fn is_forbidden(&self) -> bool {
        self.kind == BoltErrorKind::Forbidden
    }

    /// Server-supplied code and message of a FAILURE summary.
    pub fn failure(&self) -> Option<(&str, &str)> {
        match &self.kind {
            BoltErrorKind::Failed { code, message } => Some((code, message)),
            _ => None,
        }
    }

    /// True for transport-level failures after which the connection is unusable.
    pub(crate) fn is_transport(&self) -> bool {
        matches!(
            self.kind,
            BoltErrorKind::ConnectionClosed | BoltErrorKind::Io
        )
    }
}

impl From<PackStreamError> for BoltError {
    fn from(err: PackStreamError) -> Self {
        Self {
            kind: BoltErrorKind::Codec(err.kind()),
            detail: err.detail().map(str::to_string),
            location: err.location(),
        }
    }
}

impl From<std::io::Error> for BoltError {
    #[track_caller]
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;
        let kind = match err.kind() {
            ErrorKind::UnexpectedEof
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::NotConnected => BoltErrorKind::ConnectionClosed,
            _ => BoltErrorKind::Io,
        };
        Self::with_detail(kind, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_message_is_verbatim() {
        let err = BoltError::new(BoltErrorKind::Failed {
            code: "Neo.ClientError.Statement.SyntaxError".to_string(),
            message: "Invalid input 'RETRUN'".to_string(),
        });
        assert_eq!(
            err.failure(),
            Some((
                "Neo.ClientError.Statement.SyntaxError",
                "Invalid input 'RETRUN'"
            ))
        );
        assert!(err
            .to_string()
            .contains("code: Neo.ClientError.Statement.SyntaxError"));
    }

    #[test]
    fn test_io_eof_is_connection_closed() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        let err = BoltError::from(io);
        assert!(err.is_connection_closed());
        assert_eq!(err.detail(), Some("eof"));
    }

    #[test]
    fn test_codec_error_keeps_category() {
        let err = BoltError::from(PackStreamError::new(PackStreamErrorKind::NotEnoughBytes));
        assert_eq!(err.kind(), &BoltErrorKind::Codec(PackStreamErrorKind::NotEnoughBytes));
    }

    #[test]
    fn test_display_includes_location() {
        let err = BoltError::with_detail(BoltErrorKind::Forbidden, "state: defunct");
        let text = err.to_string();
        assert!(text.starts_with("The operation is forbidden in the current state. state: defunct at "));
        assert!(text.contains("error.rs:"));
    }
}
