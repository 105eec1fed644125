use crate::types::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Readiness of a transport, mirroring the browser socket's `readyState`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Connecting,
    Open,
    Closing,
    Closed,
}

/// Lifecycle and data events reported by a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Open,
    Message(String),
    Close { code: u16, reason: String },
    Error(String),
}

/// A bidirectional text-frame socket
#[async_trait]
pub trait Transport: Send + Sync {
    fn ready_state(&self) -> ReadyState;

    async fn send(&self, text: String) -> Result<()>;

    async fn close(&self, code: u16, reason: &str) -> Result<()>;
}

/// A freshly opened transport and the stream of its events
pub struct TransportHandle {
    pub transport: Arc<dyn Transport>,
    pub events: mpsc::UnboundedReceiver<TransportEvent>,
}

/// Opens transports. Returns immediately in `Connecting`; progress arrives as events.
pub trait Connector: Send + Sync {
    fn open(&self, url: &str) -> TransportHandle;
}
