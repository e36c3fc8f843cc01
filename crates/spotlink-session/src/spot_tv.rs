//! The Spot-TV side of a session: the device that owns the room.

use std::collections::BTreeSet;

use rand::Rng;
use serde_json::Value;
use spotlink_exchange::{ExchangeError, InProtocolExchange};
use spotlink_protocol::{Element, JOIN_CODE_LEN, RoomInfo};
use tokio::sync::{mpsc, watch};

use crate::inbound::decode_payload;
use crate::role::{is_spot_presence, is_unavailable, split_join_code};
use crate::{InboundEvent, SessionError, SessionOptions, SessionRole};

const JOIN_CODE_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Role for the Spot-TV.
///
/// Commands and messages from remote controls are forwarded to the
/// application on the receiver returned by [`SpotTvRole::new`]. The set of
/// connected remotes is published on a `watch` channel.
#[derive(Debug)]
pub struct SpotTvRole {
    inbound: mpsc::UnboundedSender<InboundEvent>,
    remotes: watch::Sender<BTreeSet<String>>,
}

impl SpotTvRole {
    /// Creates the role and the receiver its inbound events arrive on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<InboundEvent>) {
        let (inbound, inbound_rx) = mpsc::unbounded_channel();
        let (remotes, _) = watch::channel(BTreeSet::new());
        (Self { inbound, remotes }, inbound_rx)
    }

    /// Mints a random join code for a new room.
    pub fn generate_join_code() -> String {
        let mut rng = rand::rng();
        (0..JOIN_CODE_LEN)
            .map(|_| {
                let idx = rng.random_range(0..JOIN_CODE_CHARSET.len());
                JOIN_CODE_CHARSET[idx] as char
            })
            .collect()
    }

    /// Watches the JIDs of the remote controls currently in the room.
    pub fn remotes(&self) -> watch::Receiver<BTreeSet<String>> {
        self.remotes.subscribe()
    }

    fn forward(&self, event: InboundEvent) {
        if self.inbound.send(event).is_err() {
            tracing::debug!("inbound receiver dropped, discarding event");
        }
    }
}

impl InProtocolExchange for SpotTvRole {
    async fn exchange_code(&self, code: &str) -> Result<RoomInfo, ExchangeError> {
        split_join_code(code)
    }
}

impl SessionRole for SpotTvRole {
    fn join_code(&self, options: &SessionOptions) -> Result<String, SessionError> {
        let code = options.join_code.trim();
        if code.is_empty() {
            return Err(SessionError::MissingJoinCode);
        }
        Ok(code.to_string())
    }

    fn on_command_received(&self, iq: &Element) -> Result<Element, SessionError> {
        let from = iq.get_attr("from").unwrap_or_default();
        let ack = Element::iq_result(iq.get_attr("id"), iq.get_attr("from"));

        let Some(command) = iq.find("command") else {
            tracing::warn!(from, "command iq without a command element");
            return Ok(ack);
        };
        let command_type = command.get_attr("type");
        tracing::debug!(from, command_type, "received command");

        self.forward(InboundEvent::Command {
            from: from.to_string(),
            command_type: command_type.map(str::to_string),
            data: decode_payload(&command.text_content()),
        });
        Ok(ack)
    }

    fn on_presence_received(&self, presence: &Element) -> Result<(), SessionError> {
        let Some(from) = presence.get_attr("from") else {
            return Ok(());
        };
        // Our own presence is echoed back by the room.
        if is_spot_presence(presence) {
            return Ok(());
        }

        if is_unavailable(presence) {
            self.remotes.send_if_modified(|remotes| remotes.remove(from));
            tracing::info!(from, "remote control left");
        } else if self
            .remotes
            .send_if_modified(|remotes| remotes.insert(from.to_string()))
        {
            tracing::info!(from, "remote control joined");
        }
        Ok(())
    }

    fn process_message(&self, message_type: Option<&str>, from: &str, data: Value) {
        self.forward(InboundEvent::Message {
            from: from.to_string(),
            message_type: message_type.map(str::to_string),
            data,
        });
    }
}
