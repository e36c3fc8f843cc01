//! Room credentials and join-code structure.
//!
//! A join code is the short string a person reads off the Spot-TV screen and
//! types into a remote control. It resolves to [`RoomInfo`]: the MUC room
//! both sides join and the room's lock (password), if any.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Length of a join code: a room-name half followed by a lock half.
pub const JOIN_CODE_LEN: usize = 6;

/// How many leading join-code characters name the room.
pub const ROOM_NAME_LEN: usize = 3;

/// The resolved credentials for one join code.
///
/// Serialized with camelCase keys because that is what the join-code
/// service returns:
///
/// ```json
/// { "roomName": "abc", "roomLock": "123" }
/// ```
///
/// `roomLock` may be absent (an unlocked room).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInfo {
    /// The MUC room name.
    pub room_name: String,

    /// The room's password, if it is locked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_lock: Option<String>,
}

impl RoomInfo {
    /// Splits a join code into room name and lock without asking a backend.
    ///
    /// The first [`ROOM_NAME_LEN`] characters are the room name and the
    /// rest is the lock. Codes are case-insensitive, so both halves are
    /// lower-cased.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidMessage`] unless the code is exactly
    /// [`JOIN_CODE_LEN`] ASCII alphanumeric characters.
    pub fn from_join_code(code: &str) -> Result<Self, ProtocolError> {
        if code.len() != JOIN_CODE_LEN
            || !code.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(ProtocolError::InvalidMessage(format!(
                "join code must be {JOIN_CODE_LEN} alphanumeric characters, got {code:?}"
            )));
        }

        let code = code.to_ascii_lowercase();
        let (name, lock) = code.split_at(ROOM_NAME_LEN);
        Ok(Self {
            room_name: name.to_string(),
            room_lock: Some(lock.to_string()),
        })
    }
}

impl fmt::Display for RoomInfo {
    /// Never prints the lock; room info ends up in logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({})",
            self.room_name,
            if self.room_lock.is_some() { "locked" } else { "open" }
        )
    }
}
