use tokio::task::JoinHandle;
use std::collections::HashMap;
use crate::error::{Error, Result};
use tracing::{info, error};

/// Tracks spawned background tasks (reconciliation loops) so the binary can
/// notice one dying early and stop them all on shutdown.
pub struct TaskSupervisor {
    tasks: HashMap<String, JoinHandle<Result<()>>>,
}

impl TaskSupervisor {
    pub fn new() -> Self {
        TaskSupervisor {
            tasks: HashMap::new(),
        }
    }

    /// Spawn a new background task and register it for monitoring
    pub fn spawn<F>(&mut self, name: impl Into<String>, future: F) -> &mut Self
    where
        F: std::future::Future<Output = Result<()>> + Send + 'static,
    {
        let name = name.into();
        let handle = tokio::spawn(future);

        info!("Spawned background task: {}", name);
        self.tasks.insert(name, handle);
        self
    }

    /// Fails if any registered task has terminated; those tasks stop being tracked.
    pub fn check_health(&mut self) -> Result<()> {
        let finished: Vec<String> = self.tasks.iter()
            .filter(|(_, handle)| handle.is_finished())
            .map(|(name, _)| name.clone())
            .collect();

        if finished.is_empty() {
            return Ok(());
        }

        for name in &finished {
            self.tasks.remove(name);
        }
        let message = format!("Tasks terminated unexpectedly: {:?}", finished);
        error!("{}", message);
        Err(Error::TaskFailed(message))
    }

    pub fn active_task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Aborts every task still running.
    pub fn shutdown_all(&mut self) {
        info!("Shutting down {} background tasks", self.tasks.len());

        for (name, handle) in self.tasks.drain() {
            handle.abort();
            info!("Aborted task: {}", name);
        }
    }

    /// Wait for a specific task to complete and surface its result.
    pub async fn wait_for_task(&mut self, name: &str) -> Result<()> {
        let handle = self.tasks.remove(name)
            .ok_or_else(|| Error::TaskFailed(format!("Task {} not found", name)))?;

        handle.await
            .map_err(|e| Error::TaskFailed(format!("Task {} panicked or was cancelled: {}", name, e)))??;
        info!("Task {} completed", name);
        Ok(())
    }
}

impl Default for TaskSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_for_task_surfaces_error() {
        let mut supervisor = TaskSupervisor::new();
        supervisor.spawn("failing", async { Err(Error::ConfigError("boom".to_string())) });

        assert!(matches!(
            supervisor.wait_for_task("failing").await,
            Err(Error::ConfigError(_))
        ));
        assert_eq!(supervisor.active_task_count(), 0);
    }

    #[tokio::test]
    async fn test_check_health_reports_finished_tasks() {
        let mut supervisor = TaskSupervisor::new();
        supervisor
            .spawn("short", async { Ok(()) })
            .spawn("long", async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(matches!(supervisor.check_health(), Err(Error::TaskFailed(_))));
        assert_eq!(supervisor.active_task_count(), 1);

        supervisor.shutdown_all();
        assert_eq!(supervisor.active_task_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_task() {
        let mut supervisor = TaskSupervisor::new();
        assert!(matches!(supervisor.wait_for_task("nope").await, Err(Error::TaskFailed(_))));
    }
}
