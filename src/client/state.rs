use crate::infrastructure::{ReconnectTimer, TaskManager};
use crate::websocket::Transport;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Consolidated mutable state for NotificationClient
/// Using a single struct keeps every transition in one critical section
pub struct ClientState {
    /// Current transport, kept after close so its final state stays visible
    pub transport: Option<Arc<dyn Transport>>,

    /// Token the current transport was opened with
    pub token: Option<String>,

    /// Set from `connect()` until the transport opens or closes
    pub is_connecting: bool,

    /// Bumped per connect attempt and per disconnect; stale callbacks compare against it
    pub generation: u64,

    /// Consecutive reconnect attempts and their backoff
    pub reconnect: ReconnectTimer,

    /// Channels to (re)subscribe on every open
    pub subscriptions: BTreeSet<String>,

    /// Background task manager
    pub task_manager: TaskManager,
}

impl ClientState {
    pub fn new(reconnect: ReconnectTimer) -> Self {
        Self {
            transport: None,
            token: None,
            is_connecting: false,
            generation: 0,
            reconnect,
            subscriptions: BTreeSet::new(),
            task_manager: TaskManager::new(),
        }
    }

    /// Start a new connection generation
    pub fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }
}
