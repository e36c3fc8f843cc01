//! Error types for the protocol layer.
//!
//! Each crate in Spotlink defines its own error enum. A `ProtocolError`
//! always means the problem is in the shape of the data (a payload that
//! does not decode, a join code that cannot be split), never in networking
//! or session state.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization of a payload failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization of a payload failed.
    ///
    /// Common causes: malformed JSON in a `<message>` body, or a body that
    /// is valid JSON but not the expected shape.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The data is well-formed but violates protocol rules, e.g. a join
    /// code of the wrong length.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
