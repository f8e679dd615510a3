//! Tracks spawned tasks so the application can wind them down on shutdown.

use std::{
    future::Future,
    sync::{Mutex, MutexGuard},
    time::Duration,
};

use tokio::{task::JoinHandle, time::Instant};
use tracing::{debug, warn};

/// Owns the join handles of every task spawned through it.
#[derive(Default)]
pub struct TaskManager {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl TaskManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn handles(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.handles.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Spawns `future` on the runtime and keeps its handle.
    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(future);
        self.handles().push(handle);
    }

    /// Number of tracked tasks that have not finished yet.
    pub fn running(&self) -> usize {
        self.handles().iter().filter(|h| !h.is_finished()).count()
    }

    /// Waits up to `grace` for every tracked task to finish on its own, then aborts the rest.
    ///
    /// Tasks are expected to have been told to stop (e.g. through a cancellation token) before
    /// this is called.
    pub async fn shutdown(&self, grace: Duration) {
        let handles = std::mem::take(&mut *self.handles());
        let deadline = Instant::now() + grace;
        debug!("Joining {} tracked tasks", handles.len());

        for mut handle in handles {
            match tokio::time::timeout_at(deadline, &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) if e.is_cancelled() => {}
                Ok(Err(e)) => warn!("Task ended abnormally: {e}"),
                Err(_) => {
                    warn!("Task did not stop within {grace:?}, aborting");
                    handle.abort();
                    let _ = handle.await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shutdown_waits_for_tasks() {
        let manager = TaskManager::new();
        let (tx, rx) = tokio::sync::oneshot::channel();
        manager.spawn(async move {
            let _ = tx.send(7u8);
        });
        manager.shutdown(Duration::from_secs(1)).await;
        assert_eq!(rx.await.unwrap(), 7);
        assert_eq!(manager.running(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_aborts_stuck_tasks() {
        let manager = TaskManager::new();
        manager.spawn(async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        });
        assert_eq!(manager.running(), 1);

        let started = std::time::Instant::now();
        manager.shutdown(Duration::from_millis(50)).await;
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(manager.running(), 0);
    }

    #[test]
    fn test_spawn_from_sync_context() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let manager = TaskManager::new();
        let (tx, rx) = tokio::sync::oneshot::channel();
        {
            let _guard = runtime.enter();
            manager.spawn(async move {
                let _ = tx.send(());
            });
        }
        runtime.block_on(async {
            rx.await.unwrap();
            manager.shutdown(Duration::from_secs(1)).await;
        });
        assert_eq!(manager.running(), 0);
    }
}
