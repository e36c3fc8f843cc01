use crate::DisconnectReason;

/// Errors that can occur in the transport layer.
///
/// Every variant is `Clone` so a single failure can be handed to all
/// callers waiting on the same connect attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The underlying connection went away.
    #[error("connection closed: {0}")]
    Disconnected(DisconnectReason),

    /// Joining the room failed (bad lock, room missing, timeout).
    #[error("join failed: {0}")]
    JoinFailed(String),

    /// Sending a stanza failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Destroying the connection failed.
    #[error("teardown failed: {0}")]
    TeardownFailed(String),

    /// The server configuration cannot be used by this transport.
    #[error("invalid server configuration: {0}")]
    InvalidConfig(String),
}
