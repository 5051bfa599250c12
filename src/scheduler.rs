//! Delayed task execution.
//!
//! [`DelayedTask::schedule`] spawns a task that waits for a fixed delay and then
//! runs a future to completion. Until the delay has elapsed the task is *pending*
//! and can be cancelled; once it has started it can no longer be stopped.
//!
//! Every call schedules its own independent timer. There is no shared queue, so
//! two tasks scheduled at the same time run and complete independently.
use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const PENDING: u8 = 0;
const STARTED: u8 = 1;
const CANCELLED: u8 = 2;

/// A future scheduled to run after a delay.
pub struct DelayedTask<T> {
    state: Arc<AtomicU8>,
    cancel: CancellationToken,
    handle: JoinHandle<Option<T>>,
}

impl<T: Send + 'static> DelayedTask<T> {
    /// Schedules `f` to run after `delay`. Must be called from within a tokio runtime.
    pub fn schedule<F, Fut>(delay: Duration, f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        let state = Arc::new(AtomicU8::new(PENDING));
        let cancel = CancellationToken::new();

        let task_state = state.clone();
        let task_cancel = cancel.child_token();
        let handle = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = task_cancel.cancelled() => return None,
                _ = tokio::time::sleep(delay) => {}
            }

            // Lost the race against cancel()
            if task_state
                .compare_exchange(PENDING, STARTED, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                return None;
            }

            Some(f().await)
        });

        Self { state, cancel, handle }
    }
}

impl<T> DelayedTask<T> {
    /// Cancels the task if it has not started yet. Returns `true` when the task was
    /// cancelled by this call, `false` if it already started or was cancelled before.
    pub fn cancel(&self) -> bool {
        let cancelled = self
            .state
            .compare_exchange(PENDING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if cancelled {
            self.cancel.cancel();
        }
        cancelled
    }

    pub fn is_pending(&self) -> bool {
        self.state.load(Ordering::Acquire) == PENDING
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.load(Ordering::Acquire) == CANCELLED
    }

    /// Waits for the task. Returns `None` if it was cancelled (or panicked).
    pub async fn join(self) -> Option<T> {
        match self.handle.await {
            Ok(out) => out,
            Err(e) => {
                log::error!("Delayed task failed: {e}");
                None
            }
        }
    }
}
