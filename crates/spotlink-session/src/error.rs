//! Error types for the session layer.

use spotlink_exchange::ExchangeError;
use spotlink_transport::{DisconnectReason, TransportError};

/// Errors that can occur while establishing or running a session.
///
/// `Clone` because a connect attempt is shared: every caller holding the
/// same [`ConnectHandle`](crate::ConnectHandle) receives the same error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The join code could not be exchanged for room credentials.
    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    /// The transport failed to open, join, or stay connected.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The role does not support this operation.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    /// No join code is available to connect or reconnect with.
    #[error("no join code available")]
    MissingJoinCode,

    /// The attempt was abandoned because the session was torn down
    /// before it finished.
    #[error("connect attempt aborted by disconnect")]
    Aborted,

    /// The service task is gone.
    #[error("remote control service stopped")]
    ServiceStopped,
}

impl SessionError {
    /// The disconnect reason this error amounts to, for classification
    /// after a failed reconnect.
    ///
    /// Transport disconnects keep their own reason; a rejected room lock
    /// counts as `not-authorized`; anything else is a recoverable
    /// [`DisconnectReason::Other`] carrying the error text.
    pub fn disconnect_reason(&self) -> DisconnectReason {
        match self {
            Self::Transport(TransportError::Disconnected(reason)) => reason.clone(),
            Self::Transport(TransportError::JoinFailed(detail))
                if detail == DisconnectReason::NOT_AUTHORIZED =>
            {
                DisconnectReason::NotAuthorized
            }
            other => DisconnectReason::Other(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnect_reason_keeps_transport_reason() {
        let err = SessionError::Transport(TransportError::Disconnected(
            DisconnectReason::ServerDisconnected,
        ));
        assert_eq!(err.disconnect_reason(), DisconnectReason::ServerDisconnected);
    }

    #[test]
    fn test_disconnect_reason_not_authorized_join() {
        let err = SessionError::Transport(TransportError::JoinFailed(
            "not-authorized".into(),
        ));
        assert!(err.disconnect_reason().is_unrecoverable());
    }

    #[test]
    fn test_disconnect_reason_exchange_failure_is_recoverable() {
        let err = SessionError::Exchange(ExchangeError::Status(503));
        let reason = err.disconnect_reason();
        assert!(!reason.is_unrecoverable());
        assert!(reason.as_str().contains("503"));
    }
}
