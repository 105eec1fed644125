use crate::types::constants::{DEFAULT_HEARTBEAT_INTERVAL, request_types};
use crate::websocket::{ReadyState, Transport};
use chrono::{SecondsFormat, Utc};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::time;

pub struct HeartbeatManager {
    interval: Duration,
    transport: Weak<dyn Transport>,
}

impl HeartbeatManager {
    pub fn new(transport: &Arc<dyn Transport>) -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_HEARTBEAT_INTERVAL),
            transport: Arc::downgrade(transport),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Pings every interval, first one interval after start. Ends when the transport is dropped.
    pub async fn run(self) {
        let start = time::Instant::now() + self.interval;
        let mut interval_timer = time::interval_at(start, self.interval);
        interval_timer.set_missed_tick_behavior(time::MissedTickBehavior::Skip);

        loop {
            interval_timer.tick().await;

            let Some(transport) = self.transport.upgrade() else {
                break;
            };
            beat(transport.as_ref()).await;
        }
    }
}

/// Sends one ping if the transport is open. Returns whether a ping went out.
pub async fn beat(transport: &dyn Transport) -> bool {
    if transport.ready_state() != ReadyState::Open {
        return false;
    }

    let ping = serde_json::json!({
        "type": request_types::PING,
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    });

    match transport.send(ping.to_string()).await {
        Ok(()) => {
            tracing::debug!("Sent heartbeat");
            true
        }
        Err(e) => {
            tracing::error!("[Heartbeat] Failed to send: {}", e);
            false
        }
    }
}
