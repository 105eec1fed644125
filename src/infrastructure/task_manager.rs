use std::collections::HashMap;
use tokio::task::JoinHandle;

/// Background tasks owned by a client session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Transport event loop
    Events,
    /// Periodic ping
    Heartbeat,
    /// Pending single-shot reconnect
    Reconnect,
    /// Deadline for the transport to open
    ConnectTimeout,
}

/// Manages background tasks, at most one per kind
#[derive(Default)]
pub struct TaskManager {
    handles: HashMap<TaskKind, JoinHandle<()>>,
}

impl TaskManager {
    /// Create a new empty task manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a task, aborting the previous task of the same kind
    pub fn spawn<F>(&mut self, kind: TaskKind, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(future);
        if let Some(previous) = self.handles.insert(kind, handle) {
            previous.abort();
        }
    }

    /// Abort the task of this kind, if any
    pub fn abort(&mut self, kind: TaskKind) {
        if let Some(handle) = self.handles.remove(&kind) {
            handle.abort();
        }
    }

    /// Stop tracking a task without aborting it.
    ///
    /// A task calls this on itself before doing work that may abort its kind.
    pub fn detach(&mut self, kind: TaskKind) {
        self.handles.remove(&kind);
    }

    #[cfg(test)]
    pub(crate) fn is_pending(&self, kind: TaskKind) -> bool {
        self.handles
            .get(&kind)
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Abort all tasks without waiting
    pub fn abort_all(&mut self) {
        for (_, handle) in self.handles.drain() {
            handle.abort();
        }
    }
}

impl Drop for TaskManager {
    fn drop(&mut self) {
        self.abort_all();
    }
}
