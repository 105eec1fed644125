//! In-process doubles for the transport, token endpoint and toast surface.

use crate::infrastructure::TokenProvider;
use crate::messaging::{Notifier, Toast};
use crate::types::{RealtimeError, Result};
use crate::websocket::{Connector, ReadyState, Transport, TransportEvent, TransportHandle};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::{mpsc, watch};

/// Transport whose lifecycle the test drives by hand
pub struct MockTransport {
    state: Mutex<ReadyState>,
    sent: Mutex<Vec<String>>,
    closes: Mutex<Vec<(u16, String)>>,
    events: Mutex<Option<mpsc::UnboundedSender<TransportEvent>>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(ReadyState::Connecting),
            sent: Mutex::new(Vec::new()),
            closes: Mutex::new(Vec::new()),
            events: Mutex::new(None),
        })
    }

    pub fn set_state(&self, state: ReadyState) {
        *self.state.lock() = state;
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    pub fn closes(&self) -> Vec<(u16, String)> {
        self.closes.lock().clone()
    }

    fn push(&self, event: TransportEvent) {
        if let Some(events) = self.events.lock().as_ref() {
            let _ = events.send(event);
        }
    }

    /// Server accepted the connection
    pub fn open(&self) {
        self.set_state(ReadyState::Open);
        self.push(TransportEvent::Open);
    }

    /// Server pushed a text frame
    pub fn deliver(&self, text: &str) {
        self.push(TransportEvent::Message(text.to_string()));
    }

    pub fn fail(&self, details: &str) {
        self.push(TransportEvent::Error(details.to_string()));
    }

    /// Connection ended with `code`
    pub fn drop_connection(&self, code: u16) {
        self.set_state(ReadyState::Closed);
        self.push(TransportEvent::Close {
            code,
            reason: String::new(),
        });
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn ready_state(&self) -> ReadyState {
        *self.state.lock()
    }

    async fn send(&self, text: String) -> Result<()> {
        if self.ready_state() != ReadyState::Open {
            return Err(RealtimeError::NotConnected);
        }
        self.sent.lock().push(text);
        Ok(())
    }

    async fn close(&self, code: u16, reason: &str) -> Result<()> {
        self.closes.lock().push((code, reason.to_string()));
        self.set_state(ReadyState::Closed);
        Ok(())
    }
}

/// Connector handing out `MockTransport`s and remembering every address
pub struct MockConnector {
    opened: Mutex<Vec<(String, Arc<MockTransport>)>>,
    count: watch::Sender<usize>,
}

impl MockConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            opened: Mutex::new(Vec::new()),
            count: watch::Sender::new(0),
        })
    }

    pub fn count(&self) -> usize {
        self.opened.lock().len()
    }

    pub fn url(&self, index: usize) -> String {
        self.opened.lock()[index].0.clone()
    }

    pub fn transport(&self, index: usize) -> Arc<MockTransport> {
        Arc::clone(&self.opened.lock()[index].1)
    }

    /// Waits until `n` transports were opened and returns the latest
    pub async fn wait_for(&self, n: usize) -> Arc<MockTransport> {
        let mut rx = self.count.subscribe();
        rx.wait_for(|count| *count >= n)
            .await
            .expect("connector dropped");
        self.transport(n - 1)
    }
}

impl Connector for MockConnector {
    fn open(&self, url: &str) -> TransportHandle {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let transport = MockTransport::new();
        *transport.events.lock() = Some(events_tx);

        let count = {
            let mut opened = self.opened.lock();
            opened.push((url.to_string(), Arc::clone(&transport)));
            opened.len()
        };
        self.count.send_replace(count);

        TransportHandle {
            transport,
            events: events_rx,
        }
    }
}

/// Token endpoint returning `token-1`, `token-2`, ... unless told to fail
#[derive(Default)]
pub struct MockTokenProvider {
    failing: AtomicBool,
    fetched: AtomicUsize,
    invalidated: Mutex<Vec<String>>,
}

impl MockTokenProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetched.load(Ordering::SeqCst)
    }

    pub fn invalidated(&self) -> Vec<String> {
        self.invalidated.lock().clone()
    }
}

#[async_trait]
impl TokenProvider for MockTokenProvider {
    async fn fetch_token(&self) -> Result<String> {
        let n = self.fetched.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failing.load(Ordering::SeqCst) {
            return Err(RealtimeError::Auth("Failed to get WebSocket token".to_string()));
        }
        Ok(format!("token-{}", n))
    }

    async fn invalidate(&self, token: &str) -> Result<()> {
        self.invalidated.lock().push(token.to_string());
        Ok(())
    }
}

/// Notifier keeping every toast for inspection
#[derive(Default)]
pub struct RecordingNotifier {
    toasts: Mutex<Vec<Toast>>,
}

impl RecordingNotifier {
    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn show(&self, toast: Toast) {
        self.toasts.lock().push(toast);
    }
}
