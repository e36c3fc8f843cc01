//! Error types for code exchange.

/// Errors that can occur while turning a join code into room credentials.
///
/// No variant is retried here; retrying is the reconnect cycle's job.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExchangeError {
    /// The HTTP request could not be completed (DNS, connect, timeout).
    #[error("join code request failed: {0}")]
    Request(String),

    /// The join code service answered with a non-2xx status.
    #[error("join code service returned status {0}")]
    Status(u16),

    /// The join code service answered 2xx but the body was not valid
    /// room info JSON.
    #[error("malformed join code response: {0}")]
    Malformed(String),

    /// The code cannot be resolved (wrong length, unknown to the service).
    #[error("invalid join code: {0}")]
    InvalidCode(String),

    /// This role cannot exchange codes without a join code service.
    #[error("in-protocol code exchange is not supported: {0}")]
    Unsupported(&'static str),
}
