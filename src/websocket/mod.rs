// WebSocket module - Transport seam and its tokio-tungstenite implementation
pub mod factory;
pub mod transport;

pub use factory::{WebSocketFactory, WsTransport};
pub use transport::{Connector, ReadyState, Transport, TransportEvent, TransportHandle};
