//! # Archive Realtime
//!
//! Realtime notification client for the university document archive.
//!
//! The client authenticates with a short-lived WebSocket token fetched from the archive
//! REST API, reconnects with exponential backoff after abnormal closure, keeps the link
//! alive with pings and dispatches inbound notifications to toasts and registered handlers.
//!
//! ## Example
//!
//! ```no_run
//! use archive_realtime::{ClientConfig, NotificationClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = NotificationClient::new(ClientConfig {
//!         endpoint_url: "wss://archive.example.edu/ws".to_string(),
//!         api_url: "https://archive.example.edu/api".to_string(),
//!         auth_token: Some("session-token".to_string()),
//!         ..Default::default()
//!     })?;
//!
//!     client.on("notification", |data| println!("{}", data));
//!     client.connect().await;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod infrastructure;
pub mod messaging;
pub mod types;
pub mod websocket;

#[cfg(test)]
mod testing;

pub use client::{ClientConfig, ConnectionState, NotificationClient, NotificationClientBuilder};
pub use infrastructure::{HttpTokenProvider, TokenProvider};
pub use messaging::{Handler, HandlerId, MessageKind, Notifier, Payload, Toast, ToastLevel};
pub use types::{InboundMessage, RealtimeError, Result};
pub use websocket::{Connector, Transport};
