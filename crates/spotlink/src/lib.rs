//! # Spotlink
//!
//! Remote-control sessions between a Spot-TV and its remote controls.
//!
//! A Spot-TV and every remote controlling it meet in a chat room on a
//! messaging service. Spotlink keeps one end of that meeting alive: it
//! turns a join code into room credentials, joins the room, answers
//! inbound traffic, and reconnects with jittered backoff when the
//! connection drops for a recoverable reason.
//!
//! This meta-crate re-exports the layers and adds what an application
//! needs around them: a [`ServiceBuilder`], file-based [`SpotlinkConfig`],
//! [`telemetry::init_tracing`], and a [`shutdown`] hook.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use spotlink::prelude::*;
//!
//! // Bring a Transport for your messaging service, then:
//! // let (role, mut inbound) = SpotTvRole::new();
//! // let service = ServiceBuilder::new().build(role, my_transport);
//! // let code = SpotTvRole::generate_join_code();
//! // service.connect(SessionOptions::host(code, server_config)).await.await?;
//! ```

mod builder;
mod config;
mod error;
pub mod shutdown;
pub mod telemetry;

pub use builder::ServiceBuilder;
pub use config::SpotlinkConfig;
pub use error::SpotlinkError;

pub use spotlink_exchange as exchange;
pub use spotlink_protocol as protocol;
pub use spotlink_session as session;
pub use spotlink_transport as transport;

/// Everything an application usually needs.
pub mod prelude {
    pub use crate::{ServiceBuilder, SpotlinkConfig, SpotlinkError};
    pub use spotlink_protocol::{Element, RoomInfo};
    pub use spotlink_session::{
        ConnectHandle, ConnectionState, InboundEvent, ReconnectPolicy, RemoteControlService,
        RemoteRole, ServiceConfig, ServiceEvent, SessionError, SessionOptions, SessionRole,
        SpotTvRole,
    };
    pub use spotlink_transport::{
        Connection, DisconnectReason, InboundHandler, JoinRequest, ServerConfig, Transport,
    };
}
