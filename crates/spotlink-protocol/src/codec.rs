//! Codec trait and implementations for stanza payloads.
//!
//! Stanzas carry structured data as text content: a `<message>` body or a
//! `<command>` body is a JSON document. The session layer does not care
//! how that text is decoded, only that something implements [`Codec`].

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// ## Trait bounds explained
///
/// - `Send + Sync` → the codec is shared by inbound handlers that the
///   transport may invoke from any runtime thread.
/// - `'static` → it owns everything it needs, so it can live inside
///   long-lived tasks.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or do
    /// not match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;

    /// Decodes the text content of a stanza element.
    ///
    /// Convenience over [`decode`](Self::decode) for the common case of
    /// a JSON document embedded as element text.
    fn decode_text<T: DeserializeOwned>(
        &self,
        text: &str,
    ) -> Result<T, ProtocolError> {
        self.decode(text.as_bytes())
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Remote-control payloads are small, human-readable JSON objects, so this
/// is the only codec the session layer uses.
///
/// ## Example
///
/// ```rust
/// use spotlink_protocol::{Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let value: serde_json::Value = codec.decode_text(r#"{"view":"home"}"#).unwrap();
/// assert_eq!(value["view"], "home");
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn test_decode_text_valid_json_returns_value() {
        let value: Value = JsonCodec
            .decode_text(r#"{"isSpot":true,"view":"admin"}"#)
            .expect("valid json");
        assert_eq!(value, json!({ "isSpot": true, "view": "admin" }));
    }

    #[test]
    fn test_decode_text_malformed_json_returns_decode_error() {
        let result: Result<Value, _> = JsonCodec.decode_text("{not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_decode_text_empty_string_returns_decode_error() {
        // An empty message body is not a JSON document.
        let result: Result<Value, _> = JsonCodec.decode_text("");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_encode_produces_compact_json() {
        let bytes = JsonCodec.encode(&json!({ "a": 1 })).unwrap();
        assert_eq!(bytes, br#"{"a":1}"#);
    }
}
