use super::{ClientConfig, ClientState, ConnectionState, NotificationClientBuilder};
use crate::infrastructure::{HeartbeatManager, TaskKind, TokenProvider};
use crate::messaging::{EventHandlerRegistry, Handler, HandlerId, MessageRouter};
use crate::types::constants::{
    CONNECT_TIMEOUT_REASON, DISCONNECT_REASON, TOKEN_QUERY_PARAM, WS_CLOSE_ABNORMAL,
    WS_CLOSE_NORMAL, client_events, request_types,
};
use crate::types::Result;
use crate::websocket::{Connector, ReadyState, TransportEvent, TransportHandle};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};
use url::Url;

/// Event to emit once the state lock is released
type PendingEvent = (&'static str, Value);

/// The realtime notification client of the document archive.
///
/// `NotificationClient` owns one logical connection to the realtime server. It
/// authenticates with a short-lived token, reconnects with exponential backoff after
/// abnormal closure, pings while connected, and fans inbound messages out to the toast
/// surface and to handlers registered with [`on()`](Self::on).
///
/// Clones share the same session. Call [`disconnect()`](Self::disconnect) to end it.
///
/// # Example
///
/// ```no_run
/// use archive_realtime::{ClientConfig, NotificationClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = NotificationClient::new(ClientConfig::from_env()?)?;
///
/// client.on("document_update", |data| {
///     println!("document changed: {}", data);
/// });
///
/// client.connect().await;
/// // Use the client...
/// client.disconnect().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct NotificationClient {
    pub(crate) config: Arc<ClientConfig>,
    pub(crate) token_provider: Arc<dyn TokenProvider>,
    pub(crate) connector: Arc<dyn Connector>,
    pub(crate) handlers: Arc<EventHandlerRegistry>,
    pub(crate) router: Arc<MessageRouter>,

    // Consolidated mutable state
    pub(crate) state: Arc<RwLock<ClientState>>,
}

impl NotificationClient {
    /// Creates a client with the default token provider, transport and notifier.
    ///
    /// No connection is made until [`connect()`](Self::connect).
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::UrlParse`](crate::types::RealtimeError::UrlParse) or
    /// [`RealtimeError::Config`](crate::types::RealtimeError::Config) if the endpoint
    /// is not a `ws://` or `wss://` URL.
    pub fn new(config: ClientConfig) -> Result<Self> {
        NotificationClientBuilder::new(config).map(|builder| builder.build())
    }

    /// Starts a builder for swapping in a custom token provider, connector or notifier.
    pub fn builder(config: ClientConfig) -> Result<NotificationClientBuilder> {
        NotificationClientBuilder::new(config)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Opens the connection.
    ///
    /// Does nothing while connected or while an attempt is in flight. Returns once the
    /// token is fetched and the transport is opening; the outcome is reported through
    /// the `connected`, `disconnected`, `error`, `reconnecting` and `give_up` events.
    /// Failures never surface here: they lead to a scheduled reconnect.
    ///
    /// After the reconnect ceiling was reached, calling this starts a fresh series.
    pub async fn connect(&self) {
        self.clone().run_connect(None).await
    }

    /// `expected` is the generation a reconnect timer was scheduled in
    fn run_connect(self, expected: Option<u64>) -> BoxFuture<'static, ()> {
        async move {
            let generation = {
                let mut state = self.state.write().await;

                if let Some(expected) = expected {
                    if !state.is_current(expected) {
                        tracing::debug!("Reconnect superseded, skipping");
                        return;
                    }
                    state.task_manager.detach(TaskKind::Reconnect);
                } else if state.reconnect.attempts() >= state.reconnect.max_attempts() {
                    state.reconnect.reset();
                }

                let is_open = state
                    .transport
                    .as_ref()
                    .is_some_and(|t| t.ready_state() == ReadyState::Open);
                if is_open || state.is_connecting {
                    return;
                }

                state.is_connecting = true;
                state.next_generation()
            };

            let (url, token) = match self.fetch_endpoint_url().await {
                Ok(endpoint) => endpoint,
                Err(e) => {
                    tracing::error!("WebSocket connection failed: {}", e);
                    let pending = {
                        let mut state = self.state.write().await;
                        if !state.is_current(generation) {
                            return;
                        }
                        state.is_connecting = false;
                        self.schedule_reconnect(&mut state)
                    };
                    self.emit_all(vec![pending]);
                    return;
                }
            };

            let TransportHandle { transport, events } = self.connector.open(&url);

            let mut state = self.state.write().await;
            if !state.is_current(generation) {
                // disconnect() ran while the token was in flight
                drop(state);
                if let Err(e) = transport.close(WS_CLOSE_NORMAL, DISCONNECT_REASON).await {
                    tracing::debug!("Closing superseded transport failed: {}", e);
                }
                return;
            }

            state.transport = Some(transport);
            state.token = Some(token);
            state.task_manager.spawn(
                TaskKind::Events,
                self.clone().run_events(generation, events),
            );

            if let Some(timeout) = self.config.connect_timeout() {
                let client = self.clone();
                state.task_manager.spawn(TaskKind::ConnectTimeout, async move {
                    tokio::time::sleep(timeout).await;
                    client.on_connect_timeout(generation).await;
                });
            }

            tracing::info!("Connecting to {}", self.config.endpoint_url);
        }
        .boxed()
    }

    /// Fetches a token and returns the connection address with the token.
    ///
    /// The address goes through `Url`, so a bare host gains a root path:
    /// `ws://localhost:6001` becomes `ws://localhost:6001/?token=...`. Servers
    /// treat both forms the same. A base with a path or query keeps it and gets
    /// `token` appended.
    async fn fetch_endpoint_url(&self) -> Result<(String, String)> {
        let token = self.token_provider.fetch_token().await?;

        let mut url = Url::parse(&self.config.endpoint_url)?;
        url.query_pairs_mut().append_pair(TOKEN_QUERY_PARAM, &token);

        Ok((url.to_string(), token))
    }

    /// Drives one transport's events until it closes
    async fn run_events(
        self,
        generation: u64,
        mut events: mpsc::UnboundedReceiver<TransportEvent>,
    ) {
        while let Some(event) = events.recv().await {
            match event {
                TransportEvent::Open => self.handle_open(generation).await,
                TransportEvent::Message(text) => {
                    if self.state.read().await.is_current(generation) {
                        self.router.route_text(&text);
                    }
                }
                TransportEvent::Close { code, reason } => {
                    self.handle_close(generation, code, reason).await;
                    break;
                }
                TransportEvent::Error(details) => {
                    if self.state.read().await.is_current(generation) {
                        tracing::error!("WebSocket error: {}", details);
                        self.emit(client_events::ERROR, &json!({ "message": details }));
                    }
                }
            }
        }
    }

    async fn handle_open(&self, generation: u64) {
        let (transport, channels) = {
            let mut state = self.state.write().await;
            if !state.is_current(generation) {
                return;
            }
            let Some(transport) = state.transport.clone() else {
                return;
            };

            state.is_connecting = false;
            state.reconnect.reset();
            state.task_manager.abort(TaskKind::ConnectTimeout);

            if let Some(interval) = self.config.heartbeat_interval() {
                let heartbeat = HeartbeatManager::new(&transport).with_interval(interval);
                state
                    .task_manager
                    .spawn(TaskKind::Heartbeat, heartbeat.run());
            }

            let channels: Vec<String> = state.subscriptions.iter().cloned().collect();
            (transport, channels)
        };

        tracing::info!("WebSocket connected");

        for channel in channels {
            let request = json!({ "type": request_types::SUBSCRIBE, "channel": channel });
            if let Err(e) = transport.send(request.to_string()).await {
                tracing::error!("Failed to resubscribe to '{}': {}", channel, e);
            }
        }

        self.emit(client_events::CONNECTED, &Value::Null);
    }

    async fn handle_close(&self, generation: u64, code: u16, reason: String) {
        let pending = {
            let mut state = self.state.write().await;
            if !state.is_current(generation) {
                return;
            }
            tracing::info!("WebSocket disconnected: {} {}", code, reason);
            self.settle_closed(&mut state, code, &reason)
        };
        self.emit_all(pending);
    }

    /// Abandons an attempt whose transport never opened
    async fn on_connect_timeout(&self, generation: u64) {
        let (transport, pending) = {
            let mut state = self.state.write().await;
            if !state.is_current(generation) {
                return;
            }
            let Some(transport) = state.transport.clone() else {
                return;
            };
            if transport.ready_state() != ReadyState::Connecting {
                return;
            }

            tracing::warn!(
                "Connection attempt timed out after {}ms",
                self.config.connect_timeout_ms.unwrap_or_default()
            );

            state.task_manager.detach(TaskKind::ConnectTimeout);
            state.task_manager.abort(TaskKind::Events);
            state.next_generation();

            let pending = self.settle_closed(&mut state, WS_CLOSE_ABNORMAL, CONNECT_TIMEOUT_REASON);
            (transport, pending)
        };

        if let Err(e) = transport
            .close(WS_CLOSE_NORMAL, CONNECT_TIMEOUT_REASON)
            .await
        {
            tracing::debug!("Closing timed out transport failed: {}", e);
        }
        self.emit_all(pending);
    }

    /// Bookkeeping shared by every way a connection ends except `disconnect()`
    fn settle_closed(&self, state: &mut ClientState, code: u16, reason: &str) -> Vec<PendingEvent> {
        state.is_connecting = false;
        state.task_manager.abort(TaskKind::Heartbeat);
        state.task_manager.abort(TaskKind::Reconnect);
        state.task_manager.abort(TaskKind::ConnectTimeout);

        let mut pending = vec![(
            client_events::DISCONNECTED,
            json!({ "code": code, "reason": reason }),
        )];
        if code != WS_CLOSE_NORMAL {
            pending.push(self.schedule_reconnect(state));
        }
        pending
    }

    /// Schedules the next reconnect, or gives up at the ceiling
    fn schedule_reconnect(&self, state: &mut ClientState) -> PendingEvent {
        let max_attempts = state.reconnect.max_attempts();

        let Some(delay) = state.reconnect.next_delay() else {
            tracing::error!("Max reconnection attempts reached ({})", max_attempts);
            return (
                client_events::GIVE_UP,
                json!({ "attempts": state.reconnect.attempts() }),
            );
        };

        let attempt = state.reconnect.attempts();
        let generation = state.generation;
        let client = self.clone();
        state.task_manager.spawn(TaskKind::Reconnect, async move {
            tokio::time::sleep(delay).await;
            tracing::info!("Attempting to reconnect ({}/{})", attempt, max_attempts);
            client.run_connect(Some(generation)).await;
        });

        let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        tracing::info!(
            "Reconnecting in {}ms (attempt {}/{})",
            delay_ms,
            attempt,
            max_attempts
        );
        (
            client_events::RECONNECTING,
            json!({ "attempt": attempt, "max_attempts": max_attempts, "delay_ms": delay_ms }),
        )
    }

    /// Closes the connection on purpose. No reconnect follows.
    ///
    /// Cancels the heartbeat, any pending reconnect and any attempt in flight, closes
    /// the transport with code 1000 and revokes the session token in the background.
    /// Calling it while disconnected does nothing.
    pub async fn disconnect(&self) {
        let (transport, token) = {
            let mut state = self.state.write().await;
            state.next_generation();
            state.is_connecting = false;
            state.task_manager.abort_all();
            (state.transport.take(), state.token.take())
        };

        if let Some(transport) = transport {
            let was_closed = transport.ready_state() == ReadyState::Closed;
            tracing::info!("Disconnecting from WebSocket server");
            if let Err(e) = transport.close(WS_CLOSE_NORMAL, DISCONNECT_REASON).await {
                tracing::warn!("WebSocket close handshake failed: {}", e);
            }
            if !was_closed {
                self.emit(
                    client_events::DISCONNECTED,
                    &json!({ "code": WS_CLOSE_NORMAL, "reason": DISCONNECT_REASON }),
                );
            }
        }

        if let Some(token) = token {
            let token_provider = Arc::clone(&self.token_provider);
            tokio::spawn(async move {
                if let Err(e) = token_provider.invalidate(&token).await {
                    tracing::warn!("Failed to invalidate WebSocket token: {}", e);
                }
            });
        }
    }

    /// Sends a JSON message if the connection is open, otherwise drops it with a warning.
    pub async fn send<T: Serialize + ?Sized>(&self, message: &T) {
        let transport = self.state.read().await.transport.clone();
        let transport = match transport {
            Some(transport) if transport.ready_state() == ReadyState::Open => transport,
            _ => {
                tracing::warn!("WebSocket is not connected, dropping message");
                return;
            }
        };

        let text = match serde_json::to_string(message) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("Failed to serialize outbound message: {}", e);
                return;
            }
        };

        if let Err(e) = transport.send(text).await {
            tracing::error!("Failed to send message: {}", e);
        }
    }

    /// Tracks a server channel. Sent now when connected, and again after every reconnect.
    pub async fn subscribe(&self, channel: impl Into<String>) {
        let channel = channel.into();
        let inserted = self.state.write().await.subscriptions.insert(channel.clone());
        if inserted && self.is_connected().await {
            self.send(&json!({ "type": request_types::SUBSCRIBE, "channel": channel }))
                .await;
        }
    }

    /// Stops tracking a server channel.
    pub async fn unsubscribe(&self, channel: &str) {
        let removed = self.state.write().await.subscriptions.remove(channel);
        if removed && self.is_connected().await {
            self.send(&json!({ "type": request_types::UNSUBSCRIBE, "channel": channel }))
                .await;
        }
    }

    pub async fn subscriptions(&self) -> Vec<String> {
        self.state.read().await.subscriptions.iter().cloned().collect()
    }

    /// Registers a callback for an event name: a message type such as
    /// `document_update`, or one of `connected`, `disconnected`, `error`,
    /// `reconnecting`, `give_up`.
    pub fn on<F>(&self, event: &str, handler: F) -> HandlerId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.handlers.on(event, Arc::new(handler))
    }

    /// Registers a shared callback. Registering the same `Arc` twice is a no-op.
    pub fn on_handler(&self, event: &str, handler: Handler) -> HandlerId {
        self.handlers.on(event, handler)
    }

    pub fn off(&self, event: &str, id: HandlerId) {
        self.handlers.off(event, id)
    }

    pub(crate) fn emit(&self, event: &str, data: &Value) {
        self.handlers.emit(event, data)
    }

    fn emit_all(&self, pending: Vec<PendingEvent>) {
        for (event, data) in pending {
            self.emit(event, &data);
        }
    }

    /// Checks whether the transport is open.
    pub async fn is_connected(&self) -> bool {
        self.connection_state().await == ConnectionState::Connected
    }

    pub async fn connection_state(&self) -> ConnectionState {
        ConnectionState::of(self.state.read().await.transport.as_ref())
    }

    /// Consecutive reconnect attempts since the last successful open
    pub async fn reconnect_attempts(&self) -> u32 {
        self.state.read().await.reconnect.attempts()
    }
}
