//! Join code exchange for Spotlink.
//!
//! A join code is what a person types; a [`RoomInfo`] is what the
//! transport needs. There are two ways to get from one to the other:
//!
//! 1. **Backend lookup**: when a join code service URL is configured, ask
//!    it over HTTP (`GET {url}?code={code}` → `{"roomName", "roomLock"}`).
//! 2. **In-protocol exchange**: otherwise the session role resolves the
//!    code itself through the [`InProtocolExchange`] trait.
//!
//! [`CodeExchange`] picks between them. It never retries and never caches:
//! a failed exchange fails the connect attempt, and the session layer's
//! reconnect cycle decides what happens next.

mod config;
mod error;

pub use config::ExchangeConfig;
pub use error::ExchangeError;

use std::future::Future;

use spotlink_protocol::RoomInfo;

/// Resolves a join code without a backend service.
///
/// Implemented by each session role. The code passed in has already been
/// trimmed by [`CodeExchange::exchange_code`].
///
/// # Example
///
/// ```rust
/// use spotlink_exchange::{ExchangeError, InProtocolExchange};
/// use spotlink_protocol::RoomInfo;
///
/// /// Every code maps to one fixed, unlocked room.
/// struct Lobby;
///
/// impl InProtocolExchange for Lobby {
///     async fn exchange_code(&self, _code: &str) -> Result<RoomInfo, ExchangeError> {
///         Ok(RoomInfo { room_name: "lobby".into(), room_lock: None })
///     }
/// }
/// ```
pub trait InProtocolExchange: Send + Sync {
    /// Converts a trimmed join code into room credentials.
    fn exchange_code(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<RoomInfo, ExchangeError>> + Send;
}

/// Converts join codes into room credentials.
///
/// Cheap to share: wraps a `reqwest::Client`, which pools connections
/// internally.
#[derive(Debug, Clone)]
pub struct CodeExchange {
    http_client: reqwest::Client,
}

impl CodeExchange {
    /// Creates an exchanger whose HTTP client honours `config`.
    pub fn new(config: &ExchangeConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .unwrap_or_else(|error| {
                tracing::warn!(%error, "failed to build configured HTTP client, using defaults");
                reqwest::Client::new()
            });

        Self { http_client }
    }

    /// Resolves `code` into room credentials.
    ///
    /// The code is trimmed first. An empty code is passed through; what
    /// it means is up to the backend or the in-protocol strategy.
    ///
    /// # Errors
    /// Whatever the chosen path fails with; see [`ExchangeError`].
    pub async fn exchange_code<P>(
        &self,
        code: &str,
        service_url: Option<&str>,
        in_protocol: &P,
    ) -> Result<RoomInfo, ExchangeError>
    where
        P: InProtocolExchange + ?Sized,
    {
        let code = code.trim();

        match service_url.filter(|url| !url.is_empty()) {
            Some(url) => {
                tracing::info!(url, "using backend to exchange the join code");
                self.fetch_room_info(url, code).await
            }
            None => in_protocol.exchange_code(code).await,
        }
    }

    /// Asks the join code service at `url` for the room behind `code`.
    async fn fetch_room_info(
        &self,
        url: &str,
        code: &str,
    ) -> Result<RoomInfo, ExchangeError> {
        let response = self
            .http_client
            .get(url)
            .query(&[("code", code)])
            .send()
            .await
            .map_err(|e| ExchangeError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url, status = status.as_u16(), "join code lookup rejected");
            return Err(ExchangeError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ExchangeError::Request(e.to_string()))?;

        let room: RoomInfo = serde_json::from_slice(&body)
            .map_err(|e| ExchangeError::Malformed(e.to_string()))?;

        tracing::debug!(%room, "join code resolved by backend");
        Ok(room)
    }
}

impl Default for CodeExchange {
    fn default() -> Self {
        Self::new(&ExchangeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Records every code it is asked to exchange.
    #[derive(Default)]
    struct Recorder {
        codes: Mutex<Vec<String>>,
    }

    impl InProtocolExchange for Recorder {
        async fn exchange_code(&self, code: &str) -> Result<RoomInfo, ExchangeError> {
            self.codes.lock().unwrap().push(code.to_string());
            Ok(RoomInfo {
                room_name: code.to_lowercase(),
                room_lock: None,
            })
        }
    }

    struct Unsupported;

    impl InProtocolExchange for Unsupported {
        async fn exchange_code(&self, _code: &str) -> Result<RoomInfo, ExchangeError> {
            Err(ExchangeError::Unsupported("test role"))
        }
    }

    #[tokio::test]
    async fn test_exchange_code_trims_before_in_protocol_exchange() {
        let recorder = Recorder::default();

        let room = CodeExchange::default()
            .exchange_code("  ABC123  ", None, &recorder)
            .await
            .expect("should delegate");

        assert_eq!(*recorder.codes.lock().unwrap(), vec!["ABC123".to_string()]);
        assert_eq!(room.room_name, "abc123");
    }

    #[tokio::test]
    async fn test_exchange_code_empty_code_is_delegated() {
        let recorder = Recorder::default();

        CodeExchange::default()
            .exchange_code("   ", None, &recorder)
            .await
            .unwrap();

        assert_eq!(*recorder.codes.lock().unwrap(), vec![String::new()]);
    }

    #[tokio::test]
    async fn test_exchange_code_empty_service_url_uses_in_protocol() {
        let recorder = Recorder::default();

        CodeExchange::default()
            .exchange_code("abc123", Some(""), &recorder)
            .await
            .unwrap();

        assert_eq!(recorder.codes.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_exchange_code_in_protocol_error_propagates() {
        let result = CodeExchange::default()
            .exchange_code("abc123", None, &Unsupported)
            .await;

        assert_eq!(result, Err(ExchangeError::Unsupported("test role")));
    }
}
