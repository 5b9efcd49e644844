//! Unified error types for the dispatcher.

use alloy_transport::{RpcError, TransportErrorKind};
use thiserror::Error;

/// Top-level error type for the dispatcher.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file, chain registry file, or chain selection problem.
    #[error("config: {0}")]
    Config(String),

    /// Signing key missing or address derivation failed.
    #[error("signer: {0}")]
    Signer(String),

    /// Endpoint unreachable or the transport failed.
    #[error("network: {0}")]
    Network(String),

    /// Endpoint reachable but answered with an error or a malformed response.
    #[error("rpc: {0}")]
    Rpc(String),

    /// The configured retry cap was reached before a chain was initialised.
    #[error("bootstrap of chain {chain_id} ({name}) abandoned after {attempts} attempts")]
    Bootstrap {
        /// Numeric chain identifier.
        chain_id: u64,
        /// Display name of the chain.
        name: String,
        /// Number of attempts made.
        attempts: u32,
    },

    /// No active chain carries the requested identifier.
    #[error("chain {0} is not active")]
    NotFound(u64),

    /// Signal registration or runtime error.
    #[error("server: {0}")]
    Server(String),
}

impl Error {
    /// Shorthand for [`Error::Config`].
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// [`Error::Config`] carrying the display of an underlying cause.
    pub fn config_with(msg: impl std::fmt::Display, source: impl std::fmt::Display) -> Self {
        Self::Config(format!("{msg}: {source}"))
    }

    /// Shorthand for [`Error::Signer`].
    pub fn signer(msg: impl Into<String>) -> Self {
        Self::Signer(msg.into())
    }

    /// Returns `true` for errors that a bootstrap retry may recover from.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Rpc(_))
    }
}

impl From<RpcError<TransportErrorKind>> for Error {
    fn from(err: RpcError<TransportErrorKind>) -> Self {
        match err {
            RpcError::Transport(kind) => Self::Network(kind.to_string()),
            other => Self::Rpc(other.to_string()),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Server(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_failures_are_network_errors() {
        let err: Error = TransportErrorKind::custom_str("connection refused").into();
        assert!(matches!(err, Error::Network(ref msg) if msg.contains("connection refused")));
        assert!(err.is_transient());
    }

    #[test]
    fn response_failures_are_rpc_errors() {
        let err: Error = RpcError::<TransportErrorKind>::NullResp.into();
        assert!(matches!(err, Error::Rpc(_)));
        assert!(err.is_transient());
    }

    #[test]
    fn configuration_failures_are_not_transient() {
        assert!(!Error::config("no chains selected").is_transient());
        assert!(!Error::signer("missing key").is_transient());
        assert!(!Error::NotFound(1).is_transient());
    }
}
