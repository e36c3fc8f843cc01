//! Transport abstraction layer for Spotlink.
//!
//! The messaging substrate (an XMPP client, in practice) is an external
//! collaborator. This crate fixes the seam between it and the session
//! controller:
//!
//! - [`Transport`] opens a [`Connection`] for a server configuration and
//!   binds it to an [`InboundHandler`].
//! - [`Connection`] joins a room, sends stanzas, and is destroyed.
//! - [`InboundHandler`] is implemented by the controller; the transport
//!   calls it for inbound commands, messages, presence, and disconnects.
//! - [`DisconnectReason`] says why a connection dropped, which decides
//!   whether the controller tries to reconnect.

mod config;
mod error;

pub use config::ServerConfig;
pub use error::TransportError;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use spotlink_protocol::Element;

/// Why a connection was dropped.
///
/// Only two reasons are terminal: the server ended the session, or it
/// refused our credentials. Everything else (network blips, timeouts,
/// errors surfaced from a failed reconnect) is worth retrying.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DisconnectReason {
    /// The server closed the session on purpose.
    ServerDisconnected,
    /// Authentication or room lock was rejected.
    NotAuthorized,
    /// Any other cause, as reported by the transport.
    Other(String),
}

impl DisconnectReason {
    /// Wire name of [`ServerDisconnected`](Self::ServerDisconnected).
    pub const SERVER_DISCONNECTED: &'static str = "server-disconnected";
    /// Wire name of [`NotAuthorized`](Self::NotAuthorized).
    pub const NOT_AUTHORIZED: &'static str = "not-authorized";

    /// Maps a transport-reported reason string onto a `DisconnectReason`.
    pub fn parse(reason: &str) -> Self {
        match reason {
            Self::SERVER_DISCONNECTED => Self::ServerDisconnected,
            Self::NOT_AUTHORIZED => Self::NotAuthorized,
            other => Self::Other(other.to_string()),
        }
    }

    /// `true` when reconnecting cannot help.
    pub fn is_unrecoverable(&self) -> bool {
        matches!(self, Self::ServerDisconnected | Self::NotAuthorized)
    }

    /// The reason as a string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::ServerDisconnected => Self::SERVER_DISCONNECTED,
            Self::NotAuthorized => Self::NOT_AUTHORIZED,
            Self::Other(reason) => reason,
        }
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for DisconnectReason {
    fn from(reason: &str) -> Self {
        Self::parse(reason)
    }
}

/// Parameters for joining a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinRequest {
    /// `true` when joining as the Spot-TV (room owner), `false` for a
    /// remote control.
    pub is_host: bool,
    /// The room to join.
    pub room_name: String,
    /// The room's password, if locked.
    pub room_lock: Option<String>,
}

/// Callbacks the transport invokes for inbound traffic.
///
/// Implemented by the session controller. All methods are synchronous and
/// must not block: the transport calls them from its own receive loop.
pub trait InboundHandler: Send + Sync + 'static {
    /// An `<iq>` carrying a command. Returns the reply to send back.
    fn on_command(&self, iq: &Element) -> Element;

    /// An `<iq>` carrying a `<message>`. Returns the acknowledgment to send
    /// back; every message iq must be acknowledged.
    fn on_message(&self, iq: &Element) -> Element;

    /// A `<presence>` update from a room participant.
    fn on_presence(&self, presence: &Element);

    /// The connection dropped.
    fn on_disconnect(&self, reason: DisconnectReason);
}

/// Opens connections to a messaging service.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;

    /// Creates a connection bound to `handler`.
    ///
    /// Opening does not touch the network yet; that happens in
    /// [`Connection::join_room`].
    fn open(
        &self,
        config: &ServerConfig,
        handler: Arc<dyn InboundHandler>,
    ) -> Result<Self::Connection, TransportError>;
}

/// A live session with the messaging service.
pub trait Connection: Send + Sync + 'static {
    /// Logs in and joins the requested room.
    fn join_room(
        &self,
        request: JoinRequest,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Sends a stanza to the room or a participant.
    fn send(
        &self,
        stanza: Element,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Leaves the room and closes the connection.
    fn destroy(&self) -> impl Future<Output = Result<(), TransportError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_reasons() {
        assert_eq!(
            DisconnectReason::parse("server-disconnected"),
            DisconnectReason::ServerDisconnected
        );
        assert_eq!(
            DisconnectReason::parse("not-authorized"),
            DisconnectReason::NotAuthorized
        );
    }

    #[test]
    fn test_parse_unknown_reason_is_other() {
        assert_eq!(
            DisconnectReason::from("some-network-blip"),
            DisconnectReason::Other("some-network-blip".into())
        );
    }

    #[test]
    fn test_is_unrecoverable_only_for_terminal_reasons() {
        assert!(DisconnectReason::ServerDisconnected.is_unrecoverable());
        assert!(DisconnectReason::NotAuthorized.is_unrecoverable());
        assert!(!DisconnectReason::Other("timeout".into()).is_unrecoverable());
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for reason in [
            DisconnectReason::ServerDisconnected,
            DisconnectReason::NotAuthorized,
            DisconnectReason::Other("conn-failed".into()),
        ] {
            assert_eq!(DisconnectReason::parse(&reason.to_string()), reason);
        }
    }

    #[test]
    fn test_transport_error_display_includes_reason() {
        let err = TransportError::Disconnected(DisconnectReason::NotAuthorized);
        assert_eq!(err.to_string(), "connection closed: not-authorized");
    }
}
