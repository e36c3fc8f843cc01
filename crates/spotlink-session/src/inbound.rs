//! Routes transport callbacks into the role and the service task.
//!
//! The transport invokes [`InboundHandler`] from its own receive loop. The
//! router answers iqs synchronously (they need a reply stanza) and forwards
//! disconnects to the service task as internal events, tagged with the
//! connection they came from so stale notifications can be ignored.

use std::sync::Arc;

use serde_json::{Map, Value};
use spotlink_protocol::{Codec, Element, JsonCodec};
use spotlink_transport::{DisconnectReason, InboundHandler};
use tokio::sync::mpsc;

use crate::service::Internal;
use crate::{SessionError, SessionRole};

/// Per-connection [`InboundHandler`] handed to the transport.
pub(crate) struct InboundRouter<R: SessionRole> {
    role: Arc<R>,
    connection: u64,
    internal: mpsc::UnboundedSender<Internal>,
}

impl<R: SessionRole> InboundRouter<R> {
    pub(crate) fn new(
        role: Arc<R>,
        connection: u64,
        internal: mpsc::UnboundedSender<Internal>,
    ) -> Self {
        Self {
            role,
            connection,
            internal,
        }
    }
}

impl<R: SessionRole> InboundHandler for InboundRouter<R> {
    fn on_command(&self, iq: &Element) -> Element {
        match self.role.on_command_received(iq) {
            Ok(reply) => reply,
            Err(error) => {
                tracing::warn!(%error, from = iq.get_attr("from"), "command rejected");
                let condition = match error {
                    SessionError::NotImplemented(_) => "feature-not-implemented",
                    _ => "internal-server-error",
                };
                Element::iq_error(iq, condition)
            }
        }
    }

    fn on_message(&self, iq: &Element) -> Element {
        handle_message(self.role.as_ref(), iq)
    }

    fn on_presence(&self, presence: &Element) {
        if let Err(error) = self.role.on_presence_received(presence) {
            tracing::warn!(
                %error,
                from = presence.get_attr("from"),
                "failed to process presence"
            );
        }
    }

    fn on_disconnect(&self, reason: DisconnectReason) {
        tracing::info!(connection = self.connection, %reason, "transport disconnected");
        // The receiver only goes away when the service stops, at which
        // point nobody cares about this connection any more.
        let _ = self.internal.send(Internal::TransportDisconnected {
            connection: self.connection,
            reason,
        });
    }
}

/// Decodes an inbound message iq, hands it to the role, and returns the
/// acknowledgment.
///
/// Never fails: a missing `<message>` element or an unparseable payload is
/// logged, and the sender is acknowledged regardless.
pub(crate) fn handle_message<R: SessionRole + ?Sized>(role: &R, iq: &Element) -> Element {
    let from = iq.get_attr("from").unwrap_or_default();
    let ack = Element::iq_result(iq.get_attr("id"), iq.get_attr("from"));

    let Some(message) = iq.find("message") else {
        tracing::warn!(from, "message iq without a message element");
        return ack;
    };
    let message_type = message.get_attr("type");

    tracing::debug!(from, message_type, "received message");

    let data = decode_payload(&message.text_content());
    role.process_message(message_type, from, data);

    ack
}

/// Parses a JSON payload, substituting an empty object on failure.
pub(crate) fn decode_payload(text: &str) -> Value {
    match JsonCodec.decode_text::<Value>(text) {
        Ok(value) => value,
        Err(error) => {
            tracing::error!(%error, "failed to parse message data");
            Value::Object(Map::new())
        }
    }
}
