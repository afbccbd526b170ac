//! Background notification scheduling.
//!
//! An explicit task-submission interface over a process-lifetime task set:
//! the request path submits fire-and-forget work and returns without
//! waiting. After shutdown the scheduler is gone and `schedule` becomes a
//! no-op. Notifications are advisory telemetry, not part of the pricing
//! result contract, so dropping them is acceptable.

use std::future::Future;
use std::sync::Mutex as StdMutex;

use tokio::task::JoinSet;

/// Owner of the background notification tasks.
///
/// Requires a running tokio runtime to schedule onto.
#[derive(Debug)]
pub struct NotificationDispatcher {
    tasks: StdMutex<Option<JoinSet<()>>>,
}

impl NotificationDispatcher {
    pub fn new() -> Self {
        Self {
            tasks: StdMutex::new(Some(JoinSet::new())),
        }
    }

    /// Submit a unit of work. Returns `false` (and drops the work) when
    /// the scheduler has already shut down.
    pub fn schedule<F>(&self, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock().expect("task set lock poisoned");
        match tasks.as_mut() {
            Some(set) => {
                // Reap finished tasks so the set does not grow unboundedly.
                while set.try_join_next().is_some() {}
                set.spawn(task);
                true
            }
            None => {
                tracing::debug!("scheduler is shut down, dropping notification task");
                false
            }
        }
    }

    /// Number of tasks currently tracked (running or unreaped).
    pub fn task_count(&self) -> usize {
        self.tasks
            .lock()
            .expect("task set lock poisoned")
            .as_ref()
            .map_or(0, JoinSet::len)
    }

    pub fn is_running(&self) -> bool {
        self.tasks
            .lock()
            .expect("task set lock poisoned")
            .is_some()
    }

    /// Abort every in-flight task and refuse further scheduling.
    /// Abandoned notifications are not retried.
    pub fn shutdown(&self) {
        let set = self.tasks.lock().expect("task set lock poisoned").take();
        if let Some(mut set) = set {
            let aborted = set.len();
            set.abort_all();
            tracing::info!(aborted, "notification dispatcher shut down");
        }
    }
}

impl Default for NotificationDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn scheduled_task_runs_in_background() {
        let dispatcher = NotificationDispatcher::new();
        let (tx, rx) = oneshot::channel();

        assert!(dispatcher.schedule(async move {
            let _ = tx.send(());
        }));
        rx.await.expect("task ran");
    }

    #[tokio::test]
    async fn schedule_after_shutdown_is_a_noop() {
        let dispatcher = NotificationDispatcher::new();
        dispatcher.shutdown();
        assert!(!dispatcher.is_running());

        let ran = Arc::new(AtomicUsize::new(0));
        let ran_clone = Arc::clone(&ran);
        assert!(!dispatcher.schedule(async move {
            ran_clone.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(dispatcher.task_count(), 0);

        tokio::task::yield_now().await;
        assert_eq!(ran.load(Ordering::SeqCst), 0, "dropped, not queued");
    }

    #[tokio::test]
    async fn shutdown_aborts_in_flight_tasks() {
        let dispatcher = NotificationDispatcher::new();
        let (done_tx, done_rx) = oneshot::channel::<()>();

        dispatcher.schedule(async move {
            // Would run forever; shutdown must abort it.
            std::future::pending::<()>().await;
            let _ = done_tx.send(());
        });
        assert_eq!(dispatcher.task_count(), 1);

        dispatcher.shutdown();
        // The task was aborted, so its completion channel is dropped unsent.
        assert!(done_rx.await.is_err());
    }

    #[tokio::test]
    async fn finished_tasks_are_reaped_on_next_schedule() {
        let dispatcher = NotificationDispatcher::new();
        let (tx, rx) = oneshot::channel();
        dispatcher.schedule(async move {
            let _ = tx.send(());
        });
        rx.await.expect("first task ran");

        // Scheduling again reaps the finished first task.
        dispatcher.schedule(async {});
        assert!(dispatcher.task_count() <= 2);
    }
}
