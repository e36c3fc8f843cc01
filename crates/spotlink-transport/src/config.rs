//! Server configuration handed through to the transport.

use serde::{Deserialize, Serialize};

/// How to reach the messaging service.
///
/// The session controller treats this as opaque: it is stored with the
/// session options and passed to [`Transport::open`](crate::Transport::open)
/// on every (re)connect. Transport-specific knobs that have no named field
/// land in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Endpoint of the messaging service (BOSH or WebSocket URL).
    pub service_url: String,

    /// The service's domain, used for anonymous login.
    #[serde(default)]
    pub domain: String,

    /// The domain hosting multi-user chat rooms.
    #[serde(default)]
    pub muc_domain: String,

    /// Anything else the concrete transport understands.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ServerConfig {
    /// Full address of a room on this server: `room@muc_domain`.
    pub fn room_address(&self, room_name: &str) -> String {
        format!("{}@{}", room_name, self.muc_domain)
    }
}
