//! Wire-level vocabulary for Spotlink.
//!
//! This crate defines what travels between a Spot-TV and its remote
//! controls, independent of how it travels:
//!
//! - **Stanzas** ([`Element`]): the XML units the messaging substrate
//!   delivers (`<iq>`, `<presence>`, `<message>`), modelled as a small
//!   element tree with attribute and text access.
//! - **Room credentials** ([`RoomInfo`]): what a join code resolves to.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how structured payloads
//!   embedded in stanza text are decoded.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! ```text
//! Transport (stanzas) → Protocol (Element, RoomInfo) → Session (roles, reconnect)
//! ```
//!
//! The protocol layer knows nothing about connections or reconnects.

mod codec;
mod error;
mod stanza;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use stanza::{Element, IqType};
pub use types::{JOIN_CODE_LEN, ROOM_NAME_LEN, RoomInfo};
