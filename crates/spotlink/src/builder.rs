//! `ServiceBuilder`: fluent setup for a [`RemoteControlService`].

use std::sync::Arc;

use spotlink_exchange::ExchangeConfig;
use spotlink_session::{ReconnectPolicy, RemoteControlService, ServiceConfig, SessionRole};
use spotlink_transport::Transport;

use crate::SpotlinkConfig;

/// Builder for configuring and spawning a remote control service.
///
/// # Example
///
/// ```rust,ignore
/// use spotlink::prelude::*;
///
/// let (role, inbound) = SpotTvRole::new();
/// let role = Arc::new(role);
/// let remotes = role.remotes();
///
/// let service = ServiceBuilder::new()
///     .reconnect_policy(ReconnectPolicy { max_delay_ms: 10_000, ..Default::default() })
///     .build(role, my_transport);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ServiceBuilder {
    config: ServiceConfig,
}

impl ServiceBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from the `service` section of a loaded configuration.
    pub fn from_config(config: &SpotlinkConfig) -> Self {
        Self {
            config: config.service.clone(),
        }
    }

    /// Sets the reconnect backoff.
    pub fn reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.config.reconnect = policy;
        self
    }

    /// Sets the HTTP settings for the join code service.
    pub fn exchange_config(mut self, config: ExchangeConfig) -> Self {
        self.config.exchange = config;
        self
    }

    /// Sets the capacity of the command channel into the service task.
    pub fn command_channel_size(mut self, size: usize) -> Self {
        self.config.command_channel_size = size;
        self
    }

    /// Sets how many events a slow subscriber may lag behind.
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.config.event_capacity = capacity;
        self
    }

    /// The configuration the service will be spawned with.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Spawns the service for `role` over `transport`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn build<R, T>(self, role: Arc<R>, transport: T) -> RemoteControlService
    where
        R: SessionRole,
        T: Transport,
    {
        tracing::debug!(
            min_delay_ms = self.config.reconnect.min_delay_ms,
            max_delay_ms = self.config.reconnect.max_delay_ms,
            "spawning remote control service"
        );
        RemoteControlService::spawn(role, transport, self.config)
    }
}
