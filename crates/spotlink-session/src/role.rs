//! The `SessionRole` trait: what differs between a Spot-TV and a remote.
//!
//! The controller handles everything both ends share (code exchange,
//! joining, reconnecting). What it cannot decide on its own is delegated to
//! a role:
//!
//! - which join code to retry with after a disconnect,
//! - how to resolve a join code without a backend service,
//! - how to answer commands and react to presence,
//! - what to do with inbound messages.

use serde_json::Value;
use spotlink_exchange::{ExchangeError, InProtocolExchange};
use spotlink_protocol::{Element, RoomInfo};

use crate::{SessionError, SessionOptions};

/// Role-specific behaviour of one end of a remote-control session.
///
/// `InProtocolExchange` is a supertrait: every role must be able to resolve
/// a join code when no join code service is configured (even if only to
/// refuse).
pub trait SessionRole: InProtocolExchange + Send + Sync + 'static {
    /// The join code to use when reconnecting, given the options of the
    /// last connect.
    fn join_code(&self, options: &SessionOptions) -> Result<String, SessionError>;

    /// Handles an inbound command iq and returns the reply to send.
    ///
    /// Returning an error makes the controller answer with an error iq.
    fn on_command_received(&self, iq: &Element) -> Result<Element, SessionError>;

    /// Reacts to a presence update from a room participant.
    fn on_presence_received(&self, presence: &Element) -> Result<(), SessionError>;

    /// Handles the decoded payload of an inbound message.
    ///
    /// `data` is an empty object when the payload did not parse. The
    /// default does nothing.
    fn process_message(&self, message_type: Option<&str>, from: &str, data: Value) {
        let _ = (message_type, from, data);
    }
}

/// Something a role forwards to the application.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// A command from a remote control (Spot-TV side only).
    Command {
        from: String,
        command_type: Option<String>,
        data: Value,
    },

    /// A message from another participant.
    Message {
        from: String,
        message_type: Option<String>,
        data: Value,
    },
}

/// In-protocol exchange shared by the shipped roles: the code itself
/// carries the room name and lock.
pub(crate) fn split_join_code(code: &str) -> Result<RoomInfo, ExchangeError> {
    RoomInfo::from_join_code(code).map_err(|error| {
        tracing::warn!(%error, "join code rejected");
        ExchangeError::InvalidCode(code.to_string())
    })
}

/// Whether a presence stanza announces that its sender left.
pub(crate) fn is_unavailable(presence: &Element) -> bool {
    presence.get_attr("type") == Some("unavailable")
}

/// Whether a presence stanza comes from a Spot-TV.
pub(crate) fn is_spot_presence(presence: &Element) -> bool {
    presence
        .find("isSpot")
        .is_some_and(|el| el.text_content().trim() == "true")
}
