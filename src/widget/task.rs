//! Cancelable background tasks and deadline-bounded calls.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Owns a spawned task that stops when cancelled or dropped.
///
/// The task body receives a [`CancellationToken`] and is expected to `select!` on it at every
/// suspension point.  The join handle is aborted as well, so a task that ignores its token still
/// stops at its next await.
#[derive(Debug)]
pub(crate) struct TaskGuard {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl TaskGuard {
    /// Spawn `body` on the current runtime.
    pub(crate) fn spawn<F, Fut>(body: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let handle = tokio::spawn(body(token.clone()));
        Self {
            token,
            handle: Some(handle),
        }
    }

    /// Stop the task.  Calling this more than once is harmless.
    pub(crate) fn cancel(&mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// True once [`TaskGuard::cancel`] has been called.
    pub(crate) fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Await `fut`, giving up after `deadline`.
///
/// On expiry the future is dropped, which aborts the underlying request, and a timeout error
/// naming `what` is returned.
pub(crate) async fn bounded<T, Fut>(deadline: Duration, what: &str, fut: Fut) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::elapsed(what, deadline)),
    }
}
