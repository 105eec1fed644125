use super::{ClientConfig, ClientState, NotificationClient};
use crate::infrastructure::{HttpTokenProvider, ReconnectTimer, TokenProvider};
use crate::messaging::{EventHandlerRegistry, MessageRouter, Notifier, TracingNotifier};
use crate::types::{RealtimeError, Result};
use crate::websocket::{Connector, WebSocketFactory};
use std::sync::Arc;
use tokio::sync::RwLock;
use url::Url;

/// Builder for NotificationClient that handles initialization
pub struct NotificationClientBuilder {
    config: ClientConfig,
    token_provider: Option<Arc<dyn TokenProvider>>,
    connector: Option<Arc<dyn Connector>>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl NotificationClientBuilder {
    /// Create a new builder
    pub fn new(config: ClientConfig) -> Result<Self> {
        // Validate the endpoint up front so connect() only fails on the network
        let endpoint = Url::parse(&config.endpoint_url)?;
        if !matches!(endpoint.scheme(), "ws" | "wss") {
            return Err(RealtimeError::Config(format!(
                "endpoint must be a ws:// or wss:// URL, got '{}'",
                config.endpoint_url
            )));
        }

        Ok(Self {
            config,
            token_provider: None,
            connector: None,
            notifier: None,
        })
    }

    /// Token source, defaults to the archive REST API
    pub fn token_provider(mut self, token_provider: Arc<dyn TokenProvider>) -> Self {
        self.token_provider = Some(token_provider);
        self
    }

    /// Transport factory, defaults to tokio-tungstenite
    pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Toast surface, defaults to logging
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Build the client. No background task runs until `connect()`.
    pub fn build(self) -> NotificationClient {
        let config = self.config;

        let token_provider = self.token_provider.unwrap_or_else(|| {
            Arc::new(HttpTokenProvider::new(
                config.api_url.clone(),
                config.auth_token.clone(),
            ))
        });
        let connector = self
            .connector
            .unwrap_or_else(|| Arc::new(WebSocketFactory));
        let notifier = self
            .notifier
            .unwrap_or_else(|| Arc::new(TracingNotifier));

        let reconnect = ReconnectTimer::new(
            config.reconnect_interval(),
            config.max_reconnect_attempts,
        )
        .with_cap(config.max_reconnect_delay());

        let handlers = Arc::new(EventHandlerRegistry::new());
        let router = Arc::new(MessageRouter::new(Arc::clone(&handlers), notifier));

        NotificationClient {
            config: Arc::new(config),
            token_provider,
            connector,
            handlers,
            router,
            state: Arc::new(RwLock::new(ClientState::new(reconnect))),
        }
    }
}
