// Infrastructure module - Core background services and utilities
pub mod heartbeat;
pub mod http;
pub mod task_manager;
pub mod timer;

pub use heartbeat::HeartbeatManager;
pub use http::{HttpTokenProvider, TokenProvider};
pub use task_manager::{TaskKind, TaskManager};
pub use timer::ReconnectTimer;
