use super::transport::{Connector, ReadyState, Transport, TransportEvent, TransportHandle};
use crate::types::constants::WS_CLOSE_ABNORMAL;
use crate::types::{RealtimeError, Result};
use async_trait::async_trait;
use futures::SinkExt;
use futures::stream::{SplitSink, StreamExt};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type WsWriter = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Close status reported when the server closes without a close frame
const WS_CLOSE_NO_STATUS: u16 = 1005;

/// WebSocket factory opening tokio-tungstenite connections
#[derive(Debug, Default, Clone, Copy)]
pub struct WebSocketFactory;

impl Connector for WebSocketFactory {
    fn open(&self, url: &str) -> TransportHandle {
        tracing::debug!("Creating WebSocket connection to: {}", redact_token(url));

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let transport = Arc::new(WsTransport::new(events_tx.clone()));

        let io_task = tokio::spawn(run_io(
            url.to_string(),
            Arc::clone(&transport.state),
            Arc::clone(&transport.writer),
            events_tx,
        ));
        *transport.io_task.lock() = Some(io_task);

        TransportHandle {
            transport,
            events: events_rx,
        }
    }
}

/// A tokio-tungstenite connection driven by a background I/O task
pub struct WsTransport {
    state: Arc<RwLock<ReadyState>>,
    writer: Arc<tokio::sync::Mutex<Option<WsWriter>>>,
    events: mpsc::UnboundedSender<TransportEvent>,
    io_task: Mutex<Option<JoinHandle<()>>>,
}

impl WsTransport {
    fn new(events: mpsc::UnboundedSender<TransportEvent>) -> Self {
        Self {
            state: Arc::new(RwLock::new(ReadyState::Connecting)),
            writer: Arc::new(tokio::sync::Mutex::new(None)),
            events,
            io_task: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Transport for WsTransport {
    fn ready_state(&self) -> ReadyState {
        *self.state.read()
    }

    async fn send(&self, text: String) -> Result<()> {
        if self.ready_state() != ReadyState::Open {
            return Err(RealtimeError::NotConnected);
        }

        let mut ws_guard = self.writer.lock().await;
        match ws_guard.as_mut() {
            Some(ws) => ws.send(Message::Text(text.into())).await?,
            None => return Err(RealtimeError::NotConnected),
        }
        Ok(())
    }

    async fn close(&self, code: u16, reason: &str) -> Result<()> {
        let previous = {
            let mut state = self.state.write();
            let previous = *state;
            if matches!(previous, ReadyState::Closing | ReadyState::Closed) {
                return Ok(());
            }
            *state = ReadyState::Closing;
            previous
        };

        // Handshake still running: nothing to say goodbye to
        if previous == ReadyState::Connecting {
            if let Some(io_task) = self.io_task.lock().take() {
                io_task.abort();
            }
            *self.state.write() = ReadyState::Closed;
            let _ = self.events.send(TransportEvent::Close {
                code,
                reason: reason.to_string(),
            });
            return Ok(());
        }

        let mut ws_guard = self.writer.lock().await;
        if let Some(ws) = ws_guard.as_mut() {
            let frame = CloseFrame {
                code: CloseCode::from(code),
                reason: reason.to_string().into(),
            };
            ws.send(Message::Close(Some(frame))).await?;
        }
        Ok(())
    }
}

/// Handshake, then forward frames as events until the connection ends
async fn run_io(
    url: String,
    state: Arc<RwLock<ReadyState>>,
    writer: Arc<tokio::sync::Mutex<Option<WsWriter>>>,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    let ws_stream = match tokio_tungstenite::connect_async(url.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(e) => {
            tracing::error!("WebSocket handshake failed: {}", e);
            *state.write() = ReadyState::Closed;
            let _ = events.send(TransportEvent::Error(e.to_string()));
            let _ = events.send(TransportEvent::Close {
                code: WS_CLOSE_ABNORMAL,
                reason: String::new(),
            });
            return;
        }
    };

    let (write_half, mut read_half) = ws_stream.split();
    *writer.lock().await = Some(write_half);

    {
        let mut current = state.write();
        if *current != ReadyState::Connecting {
            return;
        }
        *current = ReadyState::Open;
    }
    let _ = events.send(TransportEvent::Open);

    tracing::info!("Starting read task");
    let (code, reason) = loop {
        match read_half.next().await {
            Some(Ok(Message::Text(text))) => {
                tracing::debug!("Received text message: {}", text.as_str());
                let _ = events.send(TransportEvent::Message(text.to_string()));
            }
            Some(Ok(Message::Close(frame))) => {
                break match frame {
                    Some(close_frame) => {
                        tracing::info!(
                            "Server closed connection: code={:?}, reason='{}'",
                            close_frame.code,
                            close_frame.reason.as_str()
                        );
                        (u16::from(close_frame.code), close_frame.reason.to_string())
                    }
                    None => {
                        tracing::warn!("Server closed connection without close frame");
                        (WS_CLOSE_NO_STATUS, String::new())
                    }
                };
            }
            Some(Ok(Message::Ping(data))) => {
                tracing::debug!("Received ping ({} bytes)", data.len());
            }
            Some(Ok(Message::Pong(data))) => {
                tracing::debug!("Received pong ({} bytes)", data.len());
            }
            Some(Ok(Message::Binary(data))) => {
                tracing::warn!("Received unexpected binary message ({} bytes)", data.len());
            }
            Some(Ok(Message::Frame(_))) => {
                tracing::debug!("Received raw frame (internal)");
            }
            Some(Err(e)) => {
                tracing::error!("WebSocket read error: {}", e);
                let _ = events.send(TransportEvent::Error(e.to_string()));
                break (WS_CLOSE_ABNORMAL, e.to_string());
            }
            None => {
                tracing::warn!("WebSocket stream ended");
                break (WS_CLOSE_ABNORMAL, String::new());
            }
        }
    };

    *state.write() = ReadyState::Closed;
    writer.lock().await.take();
    let _ = events.send(TransportEvent::Close { code, reason });
    tracing::info!("Read task finished");
}

/// Strips the query so connection tokens stay out of logs
fn redact_token(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}
