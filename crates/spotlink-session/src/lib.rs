//! Remote-control session management for Spotlink.
//!
//! This crate keeps one end of a remote-control session alive:
//!
//! 1. **Connecting**: exchange a join code for room credentials, open a
//!    transport connection, and join the room ([`RemoteControlService::connect`]).
//! 2. **Staying connected**: classify every dropped connection as
//!    recoverable or not, and run a jittered reconnect cycle for the
//!    recoverable ones.
//! 3. **Inbound traffic**: route commands, messages, and presence to the
//!    [`SessionRole`] (a [`SpotTvRole`] or a [`RemoteRole`]).
//!
//! # How it fits in the stack
//!
//! ```text
//! Application (above)  ← subscribes to ServiceEvents, reads InboundEvents
//!     ↕
//! Session Layer (this crate)  ← owns the connection lifecycle
//!     ↕
//! Exchange + Transport Layers (below)  ← join code lookup, messaging service
//! ```

mod config;
mod connect;
mod error;
mod events;
mod inbound;
mod options;
mod remote;
mod role;
mod service;
mod spot_tv;
mod state;

pub use config::{ReconnectPolicy, ServiceConfig};
pub use connect::ConnectHandle;
pub use error::SessionError;
pub use events::{ServiceEvent, ServiceStatus};
pub use options::SessionOptions;
pub use remote::{RemoteRole, SpotStatus};
pub use role::{InboundEvent, SessionRole};
pub use service::RemoteControlService;
pub use spot_tv::SpotTvRole;
pub use state::ConnectionState;
