//! The remote control service: a handle plus the actor task behind it.
//!
//! All session state lives in one Tokio task (`ServiceActor`). The public
//! [`RemoteControlService`] is a cheap, cloneable handle that talks to it
//! over an mpsc channel, the same way a room handle talks to its room.
//!
//! Anything that suspends (code exchange, joining, destroying a
//! connection, the reconnect delay) runs in a spawned task that reports
//! back on a second, internal channel. The actor itself never awaits
//! inside a transition, so each transition sees and leaves a consistent
//! [`ControllerState`].

use std::future::Future;
use std::sync::Arc;

use spotlink_exchange::CodeExchange;
use spotlink_transport::{
    Connection, DisconnectReason, InboundHandler, JoinRequest, Transport, TransportError,
};
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::inbound::InboundRouter;
use crate::state::{ControllerState, TornDown};
use crate::{
    ConnectHandle, ServiceConfig, ServiceEvent, ServiceStatus, SessionError, SessionOptions,
    SessionRole,
};

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Requests from [`RemoteControlService`] handles.
enum Command {
    Connect {
        options: SessionOptions,
        reply: oneshot::Sender<ConnectHandle>,
    },
    ConnectPromise {
        reply: oneshot::Sender<Option<ConnectHandle>>,
    },
    Disconnect {
        reply: oneshot::Sender<()>,
    },
    JoinCode {
        reply: oneshot::Sender<Result<String, SessionError>>,
    },
    Status {
        reply: oneshot::Sender<ServiceStatus>,
    },
}

/// Completions and notifications posted back to the actor by the tasks it
/// spawned and by the transport.
#[derive(Debug)]
pub(crate) enum Internal {
    /// Exchange and join of an attempt finished.
    AttemptFinished {
        attempt: u64,
        result: Result<(), SessionError>,
    },

    /// A connection finished tearing down.
    TeardownFinished,

    /// The transport reported that a connection dropped.
    TransportDisconnected {
        connection: u64,
        reason: DisconnectReason,
    },

    /// The reconnect delay elapsed.
    ReconnectDue { epoch: u64, join_code: String },

    /// A reconnect attempt failed and its teardown completed.
    ReconnectFailed { epoch: u64, error: SessionError },
}

// ---------------------------------------------------------------------------
// RemoteControlService
// ---------------------------------------------------------------------------

/// Handle to a running remote control service.
///
/// Cloning is cheap; all clones drive the same session. The service task
/// stops (destroying any live connection) once every clone is dropped.
///
/// ```rust,ignore
/// let (role, inbound) = SpotTvRole::new();
/// let service = RemoteControlService::spawn(Arc::new(role), transport, ServiceConfig::default());
/// let mut events = service.subscribe();
///
/// service.connect(SessionOptions::host(code, server)).await.await?;
/// ```
#[derive(Clone)]
pub struct RemoteControlService {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<ServiceEvent>,
}

impl RemoteControlService {
    /// Spawns the service task for `role` over `transport`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<R, T>(role: Arc<R>, transport: T, config: ServiceConfig) -> Self
    where
        R: SessionRole,
        T: Transport,
    {
        let (commands, command_rx) = mpsc::channel(config.command_channel_size.max(1));
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();

        let actor = ServiceActor {
            role,
            transport,
            exchange: CodeExchange::new(&config.exchange),
            config,
            state: ControllerState::new(),
            events: events.clone(),
            commands: command_rx,
            internal_tx,
            internal_rx,
        };
        tokio::spawn(actor.run());

        Self { commands, events }
    }

    /// Starts a session, or joins the one already underway.
    ///
    /// While an attempt is pending (or has succeeded and not been torn
    /// down) this returns the same handle again and ignores `options`.
    /// Await the handle for the outcome.
    pub async fn connect(&self, options: SessionOptions) -> ConnectHandle {
        self.request(|reply| Command::Connect { options, reply })
            .await
            .unwrap_or_else(|error| ConnectHandle::ready(Err(error)))
    }

    /// The current connect handle, if there is one.
    pub async fn connect_promise(&self) -> Option<ConnectHandle> {
        self.request(|reply| Command::ConnectPromise { reply })
            .await
            .ok()
            .flatten()
    }

    /// Ends the session and cancels any reconnect in progress.
    ///
    /// Idempotent and infallible: teardown errors are logged, and a
    /// stopped service has nothing left to disconnect. Resolves once the
    /// connection has been destroyed.
    pub async fn disconnect(&self) {
        let _ = self.request(|reply| Command::Disconnect { reply }).await;
    }

    /// `true` while a connection is being established or is up.
    pub async fn has_connection(&self) -> bool {
        self.status()
            .await
            .map(|status| status.has_connection)
            .unwrap_or(false)
    }

    /// `true` while a reconnect cycle is in progress.
    pub async fn is_reconnecting(&self) -> bool {
        self.status()
            .await
            .map(|status| status.is_reconnecting)
            .unwrap_or(false)
    }

    /// The join code the role would reconnect with.
    ///
    /// # Errors
    /// Whatever the role reports, or [`SessionError::ServiceStopped`].
    pub async fn join_code(&self) -> Result<String, SessionError> {
        self.request(|reply| Command::JoinCode { reply }).await?
    }

    /// A snapshot of the connection lifecycle.
    ///
    /// # Errors
    /// [`SessionError::ServiceStopped`] if the service task is gone.
    pub async fn status(&self) -> Result<ServiceStatus, SessionError> {
        self.request(|reply| Command::Status { reply }).await
    }

    /// Subscribes to [`ServiceEvent`]s published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ServiceEvent> {
        self.events.subscribe()
    }

    /// Sends a command and waits for its reply.
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(make(reply_tx))
            .await
            .map_err(|_| SessionError::ServiceStopped)?;
        reply_rx.await.map_err(|_| SessionError::ServiceStopped)
    }
}

impl std::fmt::Debug for RemoteControlService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteControlService")
            .field("stopped", &self.commands.is_closed())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ServiceActor
// ---------------------------------------------------------------------------

/// The task that owns the session state.
struct ServiceActor<R: SessionRole, T: Transport> {
    role: Arc<R>,
    transport: T,
    exchange: CodeExchange,
    config: ServiceConfig,
    state: ControllerState<T::Connection>,
    events: broadcast::Sender<ServiceEvent>,
    commands: mpsc::Receiver<Command>,
    internal_tx: mpsc::UnboundedSender<Internal>,
    internal_rx: mpsc::UnboundedReceiver<Internal>,
}

impl<R: SessionRole, T: Transport> ServiceActor<R, T> {
    /// Processes commands and internal events until every handle is gone.
    async fn run(mut self) {
        tracing::info!("remote control service started");

        loop {
            // Completions are applied before new commands are looked at.
            tokio::select! {
                biased;
                // The actor holds a sender, so this never yields `None`.
                Some(event) = self.internal_rx.recv() => self.handle_internal(event),
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
            }
        }

        let TornDown {
            connection,
            pending,
        } = self.state.take_session();
        if let Some(pending) = pending {
            pending.fail(SessionError::ServiceStopped);
        }
        if let Some(connection) = connection {
            if let Err(error) = connection.destroy().await {
                tracing::error!(%error, "failed to tear down connection on shutdown");
            }
        }

        tracing::info!("remote control service stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Connect { options, reply } => {
                let handle = self.handle_connect(options);
                let _ = reply.send(handle);
            }
            Command::ConnectPromise { reply } => {
                let _ = reply.send(self.state.pending_handle());
            }
            Command::Disconnect { reply } => self.handle_disconnect(reply),
            Command::JoinCode { reply } => {
                let options = self.state.options().cloned().unwrap_or_default();
                let _ = reply.send(self.role.join_code(&options));
            }
            Command::Status { reply } => {
                let _ = reply.send(ServiceStatus {
                    state: self.state.state(),
                    has_connection: self.state.has_connection(),
                    is_reconnecting: self.state.is_reconnecting(),
                });
            }
        }
    }

    fn handle_internal(&mut self, event: Internal) {
        match event {
            Internal::AttemptFinished { attempt, result } => {
                self.handle_attempt_finished(attempt, result);
            }
            Internal::TeardownFinished => self.state.teardown_finished(),
            Internal::TransportDisconnected { connection, reason } => {
                if !self.state.is_current_connection(connection) {
                    tracing::debug!(connection, %reason, "ignoring disconnect of stale connection");
                    return;
                }
                tracing::info!(connection, %reason, "connection lost");
                self.classify(reason);
            }
            Internal::ReconnectDue { epoch, join_code } => {
                self.handle_reconnect_due(epoch, join_code);
            }
            Internal::ReconnectFailed { epoch, error } => {
                self.handle_reconnect_failed(epoch, error);
            }
        }
    }

    // -- connect ----------------------------------------------------------

    fn handle_connect(&mut self, options: SessionOptions) -> ConnectHandle {
        if let Some(handle) = self.state.pending_handle() {
            tracing::debug!("connect already in progress, sharing it");
            self.state.set_options(options);
            return handle;
        }
        self.start_attempt(options, false)
    }

    /// Opens a connection and spawns exchange → join for it.
    fn start_attempt(&mut self, options: SessionOptions, reconnect: bool) -> ConnectHandle {
        let id = self.state.next_connection_id();
        let handler: Arc<dyn InboundHandler> = Arc::new(InboundRouter::new(
            Arc::clone(&self.role),
            id,
            self.internal_tx.clone(),
        ));

        let connection = match self.transport.open(&options.server_config, handler) {
            Ok(connection) => Arc::new(connection),
            Err(error) => {
                tracing::warn!(%error, "failed to open connection");
                self.state.set_options(options);
                let error = SessionError::from(error);
                if reconnect {
                    let _ = self.internal_tx.send(Internal::ReconnectFailed {
                        epoch: self.state.epoch(),
                        error: error.clone(),
                    });
                }
                return ConnectHandle::ready(Err(error));
            }
        };

        tracing::info!(
            attempt = id,
            is_host = options.is_host,
            reconnect,
            "connecting"
        );

        let is_host = options.is_host;
        let code = options.join_code.clone();
        let service_url = options.join_code_service_url.clone();
        let (attempt, handle) =
            self.state
                .begin_attempt(options, id, Arc::clone(&connection), reconnect);

        let role = Arc::clone(&self.role);
        let exchange = self.exchange.clone();
        let internal = self.internal_tx.clone();
        tokio::spawn(async move {
            let result = async {
                let room = exchange
                    .exchange_code(&code, service_url.as_deref(), role.as_ref())
                    .await?;
                tracing::debug!(attempt, room = %room, "join code exchanged");
                connection
                    .join_room(JoinRequest {
                        is_host,
                        room_name: room.room_name,
                        room_lock: room.room_lock,
                    })
                    .await?;
                Ok::<(), SessionError>(())
            }
            .await;
            let _ = internal.send(Internal::AttemptFinished { attempt, result });
        });

        handle
    }

    fn handle_attempt_finished(&mut self, attempt: u64, result: Result<(), SessionError>) {
        let Some((settle, reconnect)) = self.state.settle_attempt(attempt) else {
            tracing::debug!(attempt, "ignoring result of abandoned attempt");
            return;
        };

        match result {
            Ok(()) => {
                tracing::info!(attempt, "connected");
                settle.send(Ok(()));
                if reconnect {
                    self.complete_reconnect();
                }
            }
            Err(error) => {
                tracing::warn!(attempt, %error, "connect attempt failed");
                let epoch = self.state.epoch();
                let internal = self.internal_tx.clone();
                self.teardown(error.clone(), async move {
                    settle.send(Err(error.clone()));
                    if reconnect {
                        let _ = internal.send(Internal::ReconnectFailed { epoch, error });
                    }
                });
            }
        }
    }

    // -- disconnect -------------------------------------------------------

    fn handle_disconnect(&mut self, reply: oneshot::Sender<()>) {
        if self.state.invalidate() {
            tracing::info!("reconnect cancelled");
            self.emit(ServiceEvent::ReconnectUpdate {
                is_reconnecting: false,
            });
        }
        tracing::info!(state = %self.state.state(), "disconnecting");
        self.teardown(SessionError::Aborted, async move {
            let _ = reply.send(());
        });
    }

    /// Clears the connection and pending attempt, then destroys the
    /// connection in the background.
    ///
    /// Once destroy has returned, an unsettled attempt fails with `cause`
    /// and `after` runs.
    ///
    /// A `connect` accepted before destroy returns opens its new connection
    /// alongside the one still being destroyed.
    fn teardown<F>(&mut self, cause: SessionError, after: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let TornDown {
            connection,
            pending,
        } = self.state.take_session();
        self.state.teardown_started();

        let internal = self.internal_tx.clone();
        tokio::spawn(async move {
            if let Some(connection) = connection {
                if let Err(error) = connection.destroy().await {
                    tracing::error!(%error, "failed to tear down connection");
                }
            }
            let _ = internal.send(Internal::TeardownFinished);
            if let Some(pending) = pending {
                pending.fail(cause);
            }
            after.await;
        });
    }

    // -- reconnect cycle --------------------------------------------------

    /// Decides between giving up and reconnecting.
    fn classify(&mut self, reason: DisconnectReason) {
        if reason.is_unrecoverable() {
            self.give_up(reason);
        } else {
            self.start_reconnect(reason);
        }
    }

    /// Ends the session for good and tells subscribers why.
    fn give_up(&mut self, reason: DisconnectReason) {
        tracing::warn!(%reason, "unrecoverable disconnect");
        if self.state.invalidate() {
            self.emit(ServiceEvent::ReconnectUpdate {
                is_reconnecting: false,
            });
        }

        let events = self.events.clone();
        let cause: SessionError = TransportError::Disconnected(reason.clone()).into();
        self.teardown(cause, async move {
            let _ = events.send(ServiceEvent::UnrecoverableDisconnect { reason });
        });
    }

    fn start_reconnect(&mut self, reason: DisconnectReason) {
        if !self.state.queue_reconnect() {
            tracing::warn!(%reason, "reconnect already queued, ignoring");
            return;
        }

        tracing::info!(%reason, attempts = self.state.reconnect_attempts(), "reconnecting");
        self.emit(ServiceEvent::ReconnectUpdate {
            is_reconnecting: true,
        });

        let delay = self
            .config
            .reconnect
            .jitter_delay(self.state.reconnect_attempts());

        let options = self.state.options().cloned().unwrap_or_default();
        let role = Arc::clone(&self.role);
        let join_code = match self.state.retry_join_code(|| role.join_code(&options)) {
            Ok(code) => code,
            Err(error) => {
                tracing::warn!(%error, "no join code to reconnect with");
                self.give_up(reason);
                return;
            }
        };

        let epoch = self.state.epoch();
        let internal = self.internal_tx.clone();
        let cause: SessionError = TransportError::Disconnected(reason).into();
        self.teardown(cause, async move {
            tokio::time::sleep(delay).await;
            let _ = internal.send(Internal::ReconnectDue { epoch, join_code });
        });
    }

    fn handle_reconnect_due(&mut self, epoch: u64, join_code: String) {
        if epoch != self.state.epoch() {
            tracing::debug!(epoch, "dropping stale reconnect");
            return;
        }

        // A connect issued during the delay is adopted rather than raced.
        let adopted = match self.state.pending_mut() {
            Some(pending) if pending.is_settled() => Some(true),
            Some(pending) => {
                pending.reconnect = true;
                Some(false)
            }
            None => None,
        };
        match adopted {
            Some(true) => return self.complete_reconnect(),
            Some(false) => {
                tracing::debug!("reconnect waiting on the pending connect");
                return;
            }
            None => {}
        }

        let options = SessionOptions {
            join_code,
            ..self.state.options().cloned().unwrap_or_default()
        };
        self.start_attempt(options, true);
    }

    fn handle_reconnect_failed(&mut self, epoch: u64, error: SessionError) {
        if epoch != self.state.epoch() {
            tracing::debug!(epoch, %error, "dropping stale reconnect failure");
            return;
        }

        tracing::warn!(%error, "reconnect failed");
        self.state.finish_reconnect(false);
        self.emit(ServiceEvent::ReconnectUpdate {
            is_reconnecting: false,
        });
        self.classify(error.disconnect_reason());
    }

    fn complete_reconnect(&mut self) {
        self.state.finish_reconnect(true);
        self.emit(ServiceEvent::ReconnectUpdate {
            is_reconnecting: false,
        });
        tracing::info!("reconnected");
    }

    fn emit(&self, event: ServiceEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
