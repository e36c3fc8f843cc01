//! Unified error type for Spotlink.

use spotlink_exchange::ExchangeError;
use spotlink_protocol::ProtocolError;
use spotlink_session::SessionError;
use spotlink_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `spotlink` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum SpotlinkError {
    /// A protocol-level error (payload decoding, join code shape).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A transport-level error (open, join, send, teardown).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The join code could not be exchanged.
    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    /// A session-level error (connect failed, aborted, service stopped).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The configuration file is not valid JSON for [`SpotlinkConfig`](crate::SpotlinkConfig).
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// Reading the configuration file failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use spotlink_transport::DisconnectReason;

    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::Disconnected(DisconnectReason::ServerDisconnected);
        let spotlink_err: SpotlinkError = err.into();
        assert!(matches!(spotlink_err, SpotlinkError::Transport(_)));
        assert!(spotlink_err.to_string().contains("server-disconnected"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let spotlink_err: SpotlinkError = err.into();
        assert!(matches!(spotlink_err, SpotlinkError::Protocol(_)));
    }

    #[test]
    fn test_from_exchange_error() {
        let spotlink_err: SpotlinkError = ExchangeError::Status(503).into();
        assert!(matches!(spotlink_err, SpotlinkError::Exchange(_)));
    }

    #[test]
    fn test_from_session_error() {
        let spotlink_err: SpotlinkError = SessionError::MissingJoinCode.into();
        assert!(matches!(spotlink_err, SpotlinkError::Session(_)));
    }

    #[test]
    fn test_from_io_error() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "spotlink.json");
        let spotlink_err: SpotlinkError = err.into();
        assert!(spotlink_err.to_string().contains("spotlink.json"));
    }
}
