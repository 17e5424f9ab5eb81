use serde::Serialize;
use thiserror::Error;

/// Failures surfaced by every bridge operation.
///
/// Driver-native errors never cross the boundary; they are folded into one of these
/// variants, each carrying the underlying human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SqlBridgeError {
    /// The connection id has no stored configuration (never connected, or disconnected).
    #[error("Connection not found: {0}")]
    ConfigNotFound(String),

    /// Network, authentication, timeout or malformed-config failure while opening a connection.
    #[error("Connect failed: {0}")]
    ConnectFailure(String),

    /// Malformed SQL, constraint violation, parameter mismatch or any execution-time error.
    #[error("SQL execution error: {0}")]
    StatementFailure(String),

    /// A column value could not be coerced into a transport value.
    #[error("Value conversion error: {0}")]
    ConversionFailure(String),

    /// A caller-supplied argument was rejected before any I/O happened.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Coarse classification of [`SqlBridgeError`], serialized into failure replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    ConfigNotFound,
    ConnectFailure,
    StatementFailure,
    ConversionFailure,
    InvalidArgument,
}

impl ErrorKind {
    /// Conversion failures abort a read the same way execution failures do.
    #[must_use]
    pub fn is_statement_failure(self) -> bool {
        matches!(self, Self::StatementFailure | Self::ConversionFailure)
    }
}

impl SqlBridgeError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigNotFound(_) => ErrorKind::ConfigNotFound,
            Self::ConnectFailure(_) => ErrorKind::ConnectFailure,
            Self::StatementFailure(_) => ErrorKind::StatementFailure,
            Self::ConversionFailure(_) => ErrorKind::ConversionFailure,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
        }
    }
}

/// Anything the driver reports once a connection is open is a statement failure.
/// Connection setup maps its errors to [`SqlBridgeError::ConnectFailure`] explicitly.
#[cfg(feature = "mssql")]
impl From<tiberius::error::Error> for SqlBridgeError {
    fn from(err: tiberius::error::Error) -> Self {
        SqlBridgeError::StatementFailure(err.to_string())
    }
}
