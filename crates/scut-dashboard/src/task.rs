//! Spawned tasks bound to the lifetime of their owner.

use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A spawned task that is cancelled when the guard is dropped.
///
/// The task receives a [`CancellationToken`] to exit cleanly at its next await
/// point; the join handle is aborted as well so a task stuck in a request does
/// not outlive the guard.
#[derive(Debug)]
pub struct ScopedTask {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl ScopedTask {
    /// Spawn `task` on the current runtime with a fresh cancellation token.
    pub fn spawn<F, Fut>(handle: &tokio::runtime::Handle, task: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let handle = handle.spawn(task(token.clone()));
        Self { token, handle }
    }

    pub fn cancel(&self) {
        self.token.cancel();
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ScopedTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
