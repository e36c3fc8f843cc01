//! Controller state: the connection, the pending attempt, and the
//! reconnect bookkeeping.
//!
//! `ControllerState` is plain data with small transition methods. It is
//! owned by the service task, which is the only caller, so every
//! transition runs to completion before the next event is looked at. The
//! methods are where the two key invariants live:
//!
//! - at most one pending connect attempt (and one connection),
//! - at most one queued reconnect.

use std::fmt;
use std::sync::Arc;

use crate::connect::{ConnectHandle, Settle};
use crate::{SessionError, SessionOptions};

// ---------------------------------------------------------------------------
// ConnectionState
// ---------------------------------------------------------------------------

/// Where the connection lifecycle is.
///
/// ```text
///   Idle ──connect──→ Connecting ──joined──→ Connected
///     ↑                    │                     │
///     │                 failure              disconnect
///     │                    ▼                     ▼
///     └──────────────── Disconnecting ←──────────┘
/// ```
///
/// Reconnecting is tracked separately: a reconnect cycle passes through
/// Disconnecting, Idle (the backoff delay), and Connecting again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Connected,
    Disconnecting,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnecting => "disconnecting",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Pending attempt
// ---------------------------------------------------------------------------

/// The outstanding (or succeeded) connect attempt.
#[derive(Debug)]
pub(crate) struct Pending {
    pub(crate) attempt: u64,
    pub(crate) handle: ConnectHandle,
    /// `None` once the attempt has succeeded.
    settle: Option<Settle>,
    /// Whether the reconnect cycle is waiting on this attempt.
    pub(crate) reconnect: bool,
}

impl Pending {
    pub(crate) fn is_settled(&self) -> bool {
        self.settle.is_none()
    }

    /// Fails an unsettled attempt with `error`. A settled one is left
    /// alone.
    pub(crate) fn fail(self, error: SessionError) {
        if let Some(settle) = self.settle {
            settle.send(Err(error));
        }
    }
}

/// What [`ControllerState::take_session`] removed, for the caller to
/// destroy and settle outside the state.
#[derive(Debug)]
pub(crate) struct TornDown<C> {
    pub(crate) connection: Option<Arc<C>>,
    pub(crate) pending: Option<Pending>,
}

// ---------------------------------------------------------------------------
// Reconnect bookkeeping
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct ReconnectState {
    queued: bool,
    /// Survives failed attempts so the same room is retried.
    cached_join_code: Option<String>,
    /// Failed attempts in the current cycle; widens the backoff window.
    attempts: u32,
}

// ---------------------------------------------------------------------------
// ControllerState
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub(crate) struct ControllerState<C> {
    options: Option<SessionOptions>,
    connection: Option<(u64, Arc<C>)>,
    pending: Option<Pending>,
    reconnect: ReconnectState,
    /// Bumped whenever the session is ended on purpose (explicit or
    /// unrecoverable disconnect). Reconnect steps scheduled under an older
    /// epoch are dropped.
    epoch: u64,
    next_id: u64,
    teardowns_in_flight: usize,
}

impl<C> ControllerState<C> {
    pub(crate) fn new() -> Self {
        Self {
            options: None,
            connection: None,
            pending: None,
            reconnect: ReconnectState::default(),
            epoch: 0,
            next_id: 1,
            teardowns_in_flight: 0,
        }
    }

    // -- queries ----------------------------------------------------------

    pub(crate) fn state(&self) -> ConnectionState {
        match (&self.connection, &self.pending) {
            (Some(_), Some(p)) if p.is_settled() => ConnectionState::Connected,
            (Some(_), _) => ConnectionState::Connecting,
            (None, _) if self.teardowns_in_flight > 0 => ConnectionState::Disconnecting,
            (None, _) => ConnectionState::Idle,
        }
    }

    pub(crate) fn has_connection(&self) -> bool {
        self.connection.is_some()
    }

    pub(crate) fn is_reconnecting(&self) -> bool {
        self.reconnect.queued
    }

    pub(crate) fn options(&self) -> Option<&SessionOptions> {
        self.options.as_ref()
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    pub(crate) fn reconnect_attempts(&self) -> u32 {
        self.reconnect.attempts
    }

    pub(crate) fn pending_handle(&self) -> Option<ConnectHandle> {
        self.pending.as_ref().map(|p| p.handle.clone())
    }

    pub(crate) fn pending_mut(&mut self) -> Option<&mut Pending> {
        self.pending.as_mut()
    }

    pub(crate) fn is_current_connection(&self, id: u64) -> bool {
        matches!(&self.connection, Some((current, _)) if *current == id)
    }

    // -- connect attempts -------------------------------------------------

    /// Reserves an id for the next connection.
    pub(crate) fn next_connection_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Records a new attempt over `connection` and returns its id and
    /// handle. Replaces the cached options.
    ///
    /// Callers check [`pending_handle`](Self::pending_handle) first; there
    /// is never more than one attempt.
    pub(crate) fn begin_attempt(
        &mut self,
        options: SessionOptions,
        connection_id: u64,
        connection: Arc<C>,
        reconnect: bool,
    ) -> (u64, ConnectHandle) {
        debug_assert!(self.pending.is_none(), "attempt already pending");

        let attempt = connection_id;
        let (handle, settle) = ConnectHandle::pending();
        self.options = Some(options);
        self.connection = Some((connection_id, connection));
        self.pending = Some(Pending {
            attempt,
            handle: handle.clone(),
            settle: Some(settle),
            reconnect,
        });
        (attempt, handle)
    }

    /// Remembers `options` without starting an attempt (a connect that
    /// shares the pending attempt, or one whose transport fails to open).
    pub(crate) fn set_options(&mut self, options: SessionOptions) {
        self.options = Some(options);
    }

    /// Takes the settle sender of `attempt` if it is the current,
    /// unsettled attempt. Returns it together with the attempt's
    /// reconnect flag.
    pub(crate) fn settle_attempt(&mut self, attempt: u64) -> Option<(Settle, bool)> {
        let pending = self.pending.as_mut().filter(|p| p.attempt == attempt)?;
        let settle = pending.settle.take()?;
        Some((settle, pending.reconnect))
    }

    /// Clears the connection and pending attempt, handing them back.
    pub(crate) fn take_session(&mut self) -> TornDown<C> {
        TornDown {
            connection: self.connection.take().map(|(_, conn)| conn),
            pending: self.pending.take(),
        }
    }

    pub(crate) fn teardown_started(&mut self) {
        self.teardowns_in_flight += 1;
    }

    pub(crate) fn teardown_finished(&mut self) {
        self.teardowns_in_flight = self.teardowns_in_flight.saturating_sub(1);
    }

    // -- reconnect cycle --------------------------------------------------

    /// Marks a reconnect as queued. Returns `false` if one already is.
    pub(crate) fn queue_reconnect(&mut self) -> bool {
        if self.reconnect.queued {
            return false;
        }
        self.reconnect.queued = true;
        true
    }

    /// The join code to retry with: the cached one, or a fresh one from
    /// `derive`, which is then cached.
    pub(crate) fn retry_join_code<E>(
        &mut self,
        derive: impl FnOnce() -> Result<String, E>,
    ) -> Result<String, E> {
        if let Some(code) = &self.reconnect.cached_join_code {
            return Ok(code.clone());
        }
        let code = derive()?;
        self.reconnect.cached_join_code = Some(code.clone());
        Ok(code)
    }

    /// Ends the current reconnect attempt.
    ///
    /// On success the cycle is over: the cached code and attempt count are
    /// cleared. On failure only the queued flag drops; the cached code is
    /// kept for the next attempt.
    pub(crate) fn finish_reconnect(&mut self, success: bool) {
        self.reconnect.queued = false;
        if success {
            self.reconnect.cached_join_code = None;
            self.reconnect.attempts = 0;
        } else {
            self.reconnect.attempts = self.reconnect.attempts.saturating_add(1);
        }
    }

    /// Starts a new epoch and cancels any reconnect cycle. Returns whether
    /// a reconnect was queued.
    pub(crate) fn invalidate(&mut self) -> bool {
        self.epoch += 1;
        let was_queued = self.reconnect.queued;
        self.reconnect = ReconnectState::default();
        was_queued
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> ControllerState<()> {
        ControllerState::new()
    }

    fn begin(s: &mut ControllerState<()>, reconnect: bool) -> (u64, ConnectHandle) {
        let id = s.next_connection_id();
        s.begin_attempt(SessionOptions::default(), id, Arc::new(()), reconnect)
    }

    #[test]
    fn test_new_state_is_idle() {
        let s = state();
        assert_eq!(s.state(), ConnectionState::Idle);
        assert!(!s.has_connection());
        assert!(s.pending_handle().is_none());
    }

    #[test]
    fn test_begin_attempt_is_connecting_then_connected() {
        let mut s = state();
        let (attempt, _) = begin(&mut s, false);
        assert_eq!(s.state(), ConnectionState::Connecting);
        assert!(s.has_connection());

        let (_settle, reconnect) = s.settle_attempt(attempt).expect("current attempt");
        assert!(!reconnect);
        assert_eq!(s.state(), ConnectionState::Connected);
    }

    #[test]
    fn test_pending_handle_is_shared() {
        let mut s = state();
        let (_, handle) = begin(&mut s, false);
        assert!(s.pending_handle().unwrap().ptr_eq(&handle));
    }

    #[test]
    fn test_settle_attempt_only_once_and_only_current() {
        let mut s = state();
        let (attempt, _) = begin(&mut s, false);

        assert!(s.settle_attempt(attempt + 100).is_none());
        assert!(s.settle_attempt(attempt).is_some());
        assert!(s.settle_attempt(attempt).is_none());
    }

    #[test]
    fn test_take_session_clears_connection_and_pending() {
        let mut s = state();
        let (attempt, _) = begin(&mut s, false);

        let torn = s.take_session();
        assert!(torn.connection.is_some());
        assert!(torn.pending.is_some());
        assert!(!s.has_connection());
        assert!(s.pending_handle().is_none());
        assert!(s.settle_attempt(attempt).is_none());
    }

    #[tokio::test]
    async fn test_failing_unsettled_pending_settles_handle() {
        let mut s = state();
        let (_, handle) = begin(&mut s, false);

        s.take_session().pending.unwrap().fail(SessionError::Aborted);

        assert_eq!(handle.await, Err(SessionError::Aborted));
    }

    #[tokio::test]
    async fn test_failing_settled_pending_keeps_success() {
        let mut s = state();
        let (attempt, handle) = begin(&mut s, false);
        let (settle, _) = s.settle_attempt(attempt).unwrap();
        settle.send(Ok(()));

        s.take_session().pending.unwrap().fail(SessionError::Aborted);

        assert_eq!(handle.await, Ok(()));
    }

    #[test]
    fn test_disconnecting_while_teardown_in_flight() {
        let mut s = state();
        begin(&mut s, false);
        s.take_session();
        s.teardown_started();
        assert_eq!(s.state(), ConnectionState::Disconnecting);
        s.teardown_finished();
        assert_eq!(s.state(), ConnectionState::Idle);
    }

    #[test]
    fn test_queue_reconnect_at_most_once() {
        let mut s = state();
        assert!(s.queue_reconnect());
        assert!(!s.queue_reconnect());
        assert!(s.is_reconnecting());
        s.finish_reconnect(false);
        assert!(s.queue_reconnect());
    }

    #[test]
    fn test_retry_join_code_cached_across_failures() {
        let mut s = state();
        s.queue_reconnect();
        let first = s.retry_join_code(|| Ok::<_, ()>("abc123".to_string()));
        s.finish_reconnect(false);
        let second = s.retry_join_code(|| Ok::<_, ()>("zzz999".to_string()));

        assert_eq!(first, Ok("abc123".to_string()));
        assert_eq!(second, Ok("abc123".to_string()));
        assert_eq!(s.reconnect_attempts(), 1);
    }

    #[test]
    fn test_successful_reconnect_clears_cached_code() {
        let mut s = state();
        s.queue_reconnect();
        s.retry_join_code(|| Ok::<_, ()>("abc123".to_string())).unwrap();
        s.finish_reconnect(true);

        let next = s.retry_join_code(|| Ok::<_, ()>("def456".to_string()));
        assert_eq!(next, Ok("def456".to_string()));
        assert_eq!(s.reconnect_attempts(), 0);
        assert!(!s.is_reconnecting());
    }

    #[test]
    fn test_retry_join_code_error_caches_nothing() {
        let mut s = state();
        assert_eq!(s.retry_join_code(|| Err::<String, _>("no code")), Err("no code"));
        let next = s.retry_join_code(|| Ok::<_, &str>("abc123".to_string()));
        assert_eq!(next, Ok("abc123".to_string()));
    }

    #[test]
    fn test_invalidate_bumps_epoch_and_cancels_reconnect() {
        let mut s = state();
        s.queue_reconnect();
        s.retry_join_code(|| Ok::<_, ()>("abc123".to_string())).unwrap();
        let before = s.epoch();

        assert!(s.invalidate());
        assert_eq!(s.epoch(), before + 1);
        assert!(!s.is_reconnecting());
        assert!(!s.invalidate());
    }

    #[test]
    fn test_is_current_connection() {
        let mut s = state();
        let (attempt, _) = begin(&mut s, false);
        assert!(s.is_current_connection(attempt));
        assert!(!s.is_current_connection(attempt + 1));
        s.take_session();
        assert!(!s.is_current_connection(attempt));
    }
}
