//! Disconnecting when the host application shuts down.
//!
//! The service never watches process signals itself; the application
//! decides what counts as "shutting down" and registers it here.

use std::future::Future;

use spotlink_session::RemoteControlService;
use tokio::task::JoinHandle;

/// Disconnects `service` once `signal` resolves.
///
/// The returned task finishes after the disconnect completes. Abort it to
/// unregister the hook.
pub fn disconnect_on<F>(service: RemoteControlService, signal: F) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        signal.await;
        tracing::info!("shutting down, disconnecting remote control service");
        service.disconnect().await;
    })
}

/// Disconnects `service` on Ctrl-C.
///
/// If the signal handler cannot be installed the hook never fires.
pub fn disconnect_on_ctrl_c(service: RemoteControlService) -> JoinHandle<()> {
    disconnect_on(service, async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::warn!(%error, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    })
}
