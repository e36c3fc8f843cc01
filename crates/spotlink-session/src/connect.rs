//! `ConnectHandle`: the single pending result of a connect attempt.

use std::fmt;
use std::future::IntoFuture;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::oneshot;

use crate::SessionError;

type SharedResult = Shared<BoxFuture<'static, Result<(), SessionError>>>;

/// A cloneable handle to one connect attempt.
///
/// While an attempt is outstanding (or has succeeded and not been torn
/// down), every `connect` call returns a clone of the same handle, so
/// concurrent callers share one session instead of starting several.
/// Awaiting any clone yields the attempt's result.
///
/// ```rust,ignore
/// let first = service.connect(options.clone()).await;
/// let second = service.connect(options).await;
/// assert!(first.ptr_eq(&second));
/// first.await?;
/// ```
#[derive(Clone)]
pub struct ConnectHandle {
    inner: SharedResult,
}

/// Settles a [`ConnectHandle`]. Held by the service task.
#[derive(Debug)]
pub(crate) struct Settle(oneshot::Sender<Result<(), SessionError>>);

impl Settle {
    pub(crate) fn send(self, result: Result<(), SessionError>) {
        // Every handle clone may already be dropped.
        let _ = self.0.send(result);
    }
}

impl ConnectHandle {
    /// Creates an unsettled handle and the sender that settles it.
    pub(crate) fn pending() -> (Self, Settle) {
        let (tx, rx) = oneshot::channel();
        let inner = async move { rx.await.unwrap_or(Err(SessionError::ServiceStopped)) }
            .boxed()
            .shared();
        (Self { inner }, Settle(tx))
    }

    /// Creates a handle that is already settled with `result`.
    pub(crate) fn ready(result: Result<(), SessionError>) -> Self {
        let (handle, settle) = Self::pending();
        settle.send(result);
        handle
    }

    /// `true` when both handles refer to the same connect attempt.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.inner.ptr_eq(&other.inner)
    }

    /// The result, if the attempt has already settled.
    pub fn peek(&self) -> Option<Result<(), SessionError>> {
        self.inner.peek().cloned()
    }
}

impl IntoFuture for ConnectHandle {
    type Output = Result<(), SessionError>;
    type IntoFuture = SharedResult;

    fn into_future(self) -> Self::IntoFuture {
        self.inner
    }
}

impl fmt::Debug for ConnectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectHandle")
            .field("settled", &self.peek())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_clones_share_one_result() {
        let (handle, settle) = ConnectHandle::pending();
        let clone = handle.clone();
        assert!(handle.ptr_eq(&clone));

        settle.send(Err(SessionError::Aborted));

        assert_eq!(handle.await, Err(SessionError::Aborted));
        assert_eq!(clone.await, Err(SessionError::Aborted));
    }

    #[tokio::test]
    async fn test_dropped_settle_reports_service_stopped() {
        let (handle, settle) = ConnectHandle::pending();
        drop(settle);
        assert_eq!(handle.await, Err(SessionError::ServiceStopped));
    }

    #[tokio::test]
    async fn test_ready_handle_resolves_immediately() {
        let handle = ConnectHandle::ready(Ok(()));
        assert_eq!(handle.await, Ok(()));
    }

    #[test]
    fn test_distinct_attempts_are_not_ptr_eq() {
        let (a, _sa) = ConnectHandle::pending();
        let (b, _sb) = ConnectHandle::pending();
        assert!(!a.ptr_eq(&b));
    }
}
