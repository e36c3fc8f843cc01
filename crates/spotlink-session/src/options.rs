use std::time::Duration;

use spotlink_transport::ServerConfig;

/// Everything one connect attempt needs.
///
/// Cached by the controller on every connect so a reconnect can repeat
/// the attempt, swapping in the join code being retried.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionOptions {
    /// `true` for the Spot-TV (room owner), `false` for a remote control.
    pub is_host: bool,

    /// The code to exchange for room credentials.
    pub join_code: String,

    /// Join code service to exchange the code with. When `None`, the
    /// role's in-protocol exchange is used.
    pub join_code_service_url: Option<String>,

    /// How often the host rotates its join code, if it does.
    ///
    /// Carried for the host application, which owns the rotation; the
    /// service stores it but does not act on it.
    pub join_code_refresh_rate: Option<Duration>,

    /// How to reach the messaging service.
    pub server_config: ServerConfig,
}

impl SessionOptions {
    /// Options for a remote control joining with `join_code`.
    pub fn remote(join_code: impl Into<String>, server_config: ServerConfig) -> Self {
        Self {
            is_host: false,
            join_code: join_code.into(),
            server_config,
            ..Self::default()
        }
    }

    /// Options for a Spot-TV hosting the room behind `join_code`.
    pub fn host(join_code: impl Into<String>, server_config: ServerConfig) -> Self {
        Self {
            is_host: true,
            join_code: join_code.into(),
            server_config,
            ..Self::default()
        }
    }

    /// Builder: exchange codes through a join code service.
    pub fn with_service_url(mut self, url: impl Into<String>) -> Self {
        self.join_code_service_url = Some(url.into());
        self
    }

    /// Builder: record the host's join code rotation `rate` (informational).
    pub fn with_refresh_rate(mut self, rate: Duration) -> Self {
        self.join_code_refresh_rate = Some(rate);
        self
    }
}
