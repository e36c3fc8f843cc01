//! Events the service publishes to its subscribers.

use spotlink_transport::DisconnectReason;

use crate::ConnectionState;

/// A status change published on the service's event channel.
///
/// Subscribers get every event through their own
/// [`broadcast::Receiver`](tokio::sync::broadcast::Receiver), obtained from
/// [`RemoteControlService::subscribe`](crate::RemoteControlService::subscribe).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceEvent {
    /// A reconnect cycle started (`true`) or ended (`false`).
    ReconnectUpdate { is_reconnecting: bool },

    /// The session ended for good; no reconnect will be attempted.
    UnrecoverableDisconnect { reason: DisconnectReason },
}

/// Point-in-time view of the service, returned by
/// [`RemoteControlService::status`](crate::RemoteControlService::status).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceStatus {
    /// Where the connection lifecycle currently is.
    pub state: ConnectionState,
    /// Whether a connection is being established or is up.
    pub has_connection: bool,
    /// Whether a reconnect cycle is in progress.
    pub is_reconnecting: bool,
}
