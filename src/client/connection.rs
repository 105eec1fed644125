use crate::websocket::{ReadyState, Transport};
use std::sync::Arc;

/// Lifecycle of the client's connection, derived from its transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Closing,
    Closed,
}

impl ConnectionState {
    pub fn of(transport: Option<&Arc<dyn Transport>>) -> Self {
        match transport.map(|t| t.ready_state()) {
            None => Self::Disconnected,
            Some(ReadyState::Connecting) => Self::Connecting,
            Some(ReadyState::Open) => Self::Connected,
            Some(ReadyState::Closing) => Self::Closing,
            Some(ReadyState::Closed) => Self::Closed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Closing => "closing",
            Self::Closed => "closed",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
