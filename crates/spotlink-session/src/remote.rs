//! The remote control side of a session.

use std::collections::BTreeMap;

use serde_json::Value;
use spotlink_exchange::{ExchangeError, InProtocolExchange};
use spotlink_protocol::{Element, RoomInfo};
use tokio::sync::{mpsc, watch};

use crate::role::{is_spot_presence, is_unavailable, split_join_code};
use crate::{InboundEvent, SessionError, SessionOptions, SessionRole};

/// What the Spot-TV last announced about itself in its presence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotStatus {
    /// The Spot-TV's JID in the room.
    pub jid: String,
    /// Presence child elements by name, e.g. `audioMuted → "false"`.
    pub fields: BTreeMap<String, String>,
}

impl SpotStatus {
    fn from_presence(jid: &str, presence: &Element) -> Self {
        let fields = presence
            .children()
            .iter()
            .map(|child| (child.name().to_string(), child.text_content()))
            .collect();
        Self {
            jid: jid.to_string(),
            fields,
        }
    }
}

/// Role for a remote control.
///
/// Remotes send commands but never accept them. The Spot-TV's status is
/// published on a `watch` channel (`None` while it is not in the room) and
/// messages are forwarded on the receiver returned by [`RemoteRole::new`].
#[derive(Debug)]
pub struct RemoteRole {
    inbound: mpsc::UnboundedSender<InboundEvent>,
    spot_status: watch::Sender<Option<SpotStatus>>,
}

impl RemoteRole {
    /// Creates the role and the receiver its inbound events arrive on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<InboundEvent>) {
        let (inbound, inbound_rx) = mpsc::unbounded_channel();
        let (spot_status, _) = watch::channel(None);
        (
            Self {
                inbound,
                spot_status,
            },
            inbound_rx,
        )
    }

    /// Watches the Spot-TV's status.
    pub fn spot_status(&self) -> watch::Receiver<Option<SpotStatus>> {
        self.spot_status.subscribe()
    }
}

impl InProtocolExchange for RemoteRole {
    async fn exchange_code(&self, code: &str) -> Result<RoomInfo, ExchangeError> {
        split_join_code(code)
    }
}

impl SessionRole for RemoteRole {
    fn join_code(&self, options: &SessionOptions) -> Result<String, SessionError> {
        Ok(options.join_code.clone())
    }

    fn on_command_received(&self, _iq: &Element) -> Result<Element, SessionError> {
        Err(SessionError::NotImplemented("remote controls do not accept commands"))
    }

    fn on_presence_received(&self, presence: &Element) -> Result<(), SessionError> {
        let Some(from) = presence.get_attr("from") else {
            return Ok(());
        };

        if is_unavailable(presence) {
            let left = self.spot_status.send_if_modified(|status| {
                if status.as_ref().is_some_and(|s| s.jid == from) {
                    *status = None;
                    true
                } else {
                    false
                }
            });
            if left {
                tracing::info!(from, "spot-tv left the room");
            }
        } else if is_spot_presence(presence) {
            let status = SpotStatus::from_presence(from, presence);
            tracing::debug!(from, fields = status.fields.len(), "spot-tv status updated");
            self.spot_status.send_replace(Some(status));
        }
        Ok(())
    }

    fn process_message(&self, message_type: Option<&str>, from: &str, data: Value) {
        let event = InboundEvent::Message {
            from: from.to_string(),
            message_type: message_type.map(str::to_string),
            data,
        };
        if self.inbound.send(event).is_err() {
            tracing::debug!("inbound receiver dropped, discarding message");
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use spotlink_transport::InboundHandler;

    use super::*;

    fn spot_presence() -> Element {
        Element::new("presence")
            .attr("from", "room@muc/spot")
            .child(Element::new("isSpot").text("true"))
            .child(Element::new("audioMuted").text("false"))
            .child(Element::new("inMeeting").text("true"))
    }

    #[test]
    fn test_on_command_received_is_not_implemented() {
        let (role, _rx) = RemoteRole::new();
        let result = role.on_command_received(&Element::new("iq"));
        assert!(matches!(result, Err(SessionError::NotImplemented(_))));
    }

    #[test]
    fn test_on_presence_received_spot_presence_sets_status() {
        let (role, _rx) = RemoteRole::new();
        let status = role.spot_status();

        role.on_presence_received(&spot_presence()).unwrap();

        let current = status.borrow().clone().expect("spot status");
        assert_eq!(current.jid, "room@muc/spot");
        assert_eq!(current.fields.get("isSpot").map(String::as_str), Some("true"));
        assert_eq!(current.fields.get("inMeeting").map(String::as_str), Some("true"));
    }

    #[test]
    fn test_on_presence_received_spot_unavailable_clears_status() {
        let (role, _rx) = RemoteRole::new();
        role.on_presence_received(&spot_presence()).unwrap();

        let other_leaves = Element::new("presence")
            .attr("from", "room@muc/other-remote")
            .attr("type", "unavailable");
        role.on_presence_received(&other_leaves).unwrap();
        assert!(role.spot_status().borrow().is_some());

        let spot_leaves = Element::new("presence")
            .attr("from", "room@muc/spot")
            .attr("type", "unavailable");
        role.on_presence_received(&spot_leaves).unwrap();
        assert!(role.spot_status().borrow().is_none());
    }

    #[test]
    fn test_on_presence_received_remote_presence_ignored() {
        let (role, _rx) = RemoteRole::new();
        let remote = Element::new("presence").attr("from", "room@muc/other-remote");

        role.on_presence_received(&remote).unwrap();

        assert!(role.spot_status().borrow().is_none());
    }

    #[test]
    fn test_process_message_forwards_event() {
        let (role, mut rx) = RemoteRole::new();

        role.process_message(Some("meetingJoined"), "room@muc/spot", json!({ "id": 1 }));

        assert_eq!(
            rx.try_recv().unwrap(),
            InboundEvent::Message {
                from: "room@muc/spot".into(),
                message_type: Some("meetingJoined".into()),
                data: json!({ "id": 1 }),
            }
        );
    }

    #[test]
    fn test_join_code_returns_code_used_to_connect() {
        let (role, _rx) = RemoteRole::new();
        let options = SessionOptions {
            join_code: "xyz789".into(),
            ..SessionOptions::default()
        };
        assert_eq!(role.join_code(&options), Ok("xyz789".to_string()));
    }

    #[test]
    fn test_router_answers_remote_command_with_not_implemented() {
        let (role, _rx) = RemoteRole::new();
        let (tx, _internal) = mpsc::unbounded_channel();
        let router = crate::inbound::InboundRouter::new(std::sync::Arc::new(role), 1, tx);
        let iq = Element::new("iq").attr("id", "c1").attr("from", "room@muc/other");

        let reply = router.on_command(&iq);

        assert_eq!(reply.get_attr("type"), Some("error"));
        assert_eq!(reply.get_attr("to"), Some("room@muc/other"));
        assert!(reply.find("feature-not-implemented").is_some());
    }
}
