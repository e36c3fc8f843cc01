//! Service configuration and reconnect backoff.

use std::time::Duration;

use rand::Rng;
use serde::Deserialize;
use spotlink_exchange::ExchangeConfig;

// ---------------------------------------------------------------------------
// ReconnectPolicy
// ---------------------------------------------------------------------------

/// How long to wait before each reconnect attempt.
///
/// Many remotes lose the same server at the same moment. If they all
/// retried after a fixed delay they would hit it again in lockstep, so each
/// delay is drawn uniformly from a window that widens with every failed
/// attempt in the current cycle:
///
/// ```text
/// attempt 0: [min, base]
/// attempt n: [min, min(max, base * factor^n)]
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReconnectPolicy {
    /// Lower bound of every delay. Default: 500 ms.
    pub min_delay_ms: u64,
    /// Upper bound of the first delay. Default: 1 s.
    pub base_delay_ms: u64,
    /// Growth of the upper bound per failed attempt. Default: 2.0.
    pub factor: f64,
    /// Hard cap on the upper bound. Default: 30 s.
    pub max_delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            min_delay_ms: 500,
            base_delay_ms: 1_000,
            factor: 2.0,
            max_delay_ms: 30_000,
        }
    }
}

impl ReconnectPolicy {
    /// A policy that reconnects after exactly `delay`. Mostly for tests.
    pub fn fixed(delay: Duration) -> Self {
        let ms = delay.as_millis() as u64;
        Self {
            min_delay_ms: ms,
            base_delay_ms: ms,
            factor: 1.0,
            max_delay_ms: ms,
        }
    }

    /// Upper bound of the jitter window for the given attempt.
    pub fn window_ceiling(&self, attempt: u32) -> Duration {
        let grown = self.base_delay_ms as f64 * self.factor.max(1.0).powi(attempt as i32);
        let ceiling = grown.min(self.max_delay_ms as f64).max(self.min_delay_ms as f64);
        Duration::from_millis(ceiling as u64)
    }

    /// Draws the delay before reconnect attempt number `attempt`.
    pub fn jitter_delay(&self, attempt: u32) -> Duration {
        let low = self.min_delay_ms;
        let high = self.window_ceiling(attempt).as_millis() as u64;
        if high <= low {
            return Duration::from_millis(low);
        }
        Duration::from_millis(rand::rng().random_range(low..=high))
    }
}

// ---------------------------------------------------------------------------
// ServiceConfig
// ---------------------------------------------------------------------------

/// Configuration for a [`RemoteControlService`](crate::RemoteControlService).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Backoff between reconnect attempts.
    pub reconnect: ReconnectPolicy,

    /// HTTP settings for the join code service.
    pub exchange: ExchangeConfig,

    /// Capacity of the command channel into the service task.
    pub command_channel_size: usize,

    /// How many undelivered events a slow subscriber may lag behind.
    pub event_capacity: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            reconnect: ReconnectPolicy::default(),
            exchange: ExchangeConfig::default(),
            command_channel_size: 64,
            event_capacity: 32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_grows_then_caps() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.window_ceiling(0), Duration::from_millis(1_000));
        assert_eq!(policy.window_ceiling(1), Duration::from_millis(2_000));
        assert_eq!(policy.window_ceiling(3), Duration::from_millis(8_000));
        assert_eq!(policy.window_ceiling(10), Duration::from_millis(30_000));
    }

    #[test]
    fn test_jitter_delay_stays_inside_window() {
        let policy = ReconnectPolicy::default();
        for attempt in 0..6 {
            for _ in 0..50 {
                let delay = policy.jitter_delay(attempt);
                assert!(delay >= Duration::from_millis(policy.min_delay_ms));
                assert!(delay <= policy.window_ceiling(attempt));
            }
        }
    }

    #[test]
    fn test_fixed_policy_is_deterministic() {
        let policy = ReconnectPolicy::fixed(Duration::from_millis(250));
        assert_eq!(policy.jitter_delay(0), Duration::from_millis(250));
        assert_eq!(policy.jitter_delay(7), Duration::from_millis(250));
    }

    #[test]
    fn test_service_config_partial_json_keeps_defaults() {
        let config: ServiceConfig =
            serde_json::from_str(r#"{ "reconnect": { "max_delay_ms": 5000 } }"#).unwrap();
        assert_eq!(config.reconnect.max_delay_ms, 5_000);
        assert_eq!(config.reconnect.min_delay_ms, 500);
        assert_eq!(config.command_channel_size, 64);
        assert_eq!(config.event_capacity, 32);
    }
}
