//! Error types for the connection multiplexer.

use thiserror::Error;

use crate::addr::ConnKey;

/// Result alias for multiplexer operations.
pub type Result<T> = std::result::Result<T, MuxError>;

/// Multiplexer errors.
///
/// Only removal can fail; registration is infallible. Both removal
/// errors are recoverable and left to the caller to judge (a failed removal
/// during connection teardown is usually logged and ignored).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MuxError {
    /// No connection has ever been registered under the derived key, or all
    /// of them have since been removed.
    #[error("cannot remove connection, connection is unknown ({key})")]
    UnknownConnection {
        /// Key derived from the connection's local address
        key: ConnKey,
    },

    /// Other connections share the key, but this handle is not among them.
    #[error("cannot remove connection, connection not found ({key})")]
    ConnectionNotFound {
        /// Key derived from the connection's local address
        key: ConnKey,
    },
}

impl MuxError {
    /// Short label for the error kind, used as a metric attribute.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownConnection { .. } => "unknown_connection",
            Self::ConnectionNotFound { .. } => "connection_not_found",
        }
    }
}

/// A network label or local address could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid address: {0}")]
pub struct AddrParseError(String);

impl AddrParseError {
    pub(crate) fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}
