use super::handlers::EventHandlerRegistry;
use super::payload::Payload;
use super::toast::{Notifier, Toast};
use super::{ControlKind, MessageKind};
use crate::types::message::InboundMessage;
use std::sync::Arc;

/// Routes inbound messages to the toast surface and to subscribers
pub struct MessageRouter {
    handlers: Arc<EventHandlerRegistry>,
    notifier: Arc<dyn Notifier>,
}

impl MessageRouter {
    pub fn new(handlers: Arc<EventHandlerRegistry>, notifier: Arc<dyn Notifier>) -> Self {
        Self { handlers, notifier }
    }

    /// Parses a text frame and routes it. Malformed frames are logged and dropped.
    pub fn route_text(&self, text: &str) {
        match serde_json::from_str::<InboundMessage>(text) {
            Ok(message) => self.route(message),
            Err(e) => {
                tracing::error!("Error parsing realtime message: {} - Raw: {}", e, text);
            }
        }
    }

    /// Routes a message to its dedicated handling, then to subscribers of its type
    pub fn route(&self, message: InboundMessage) {
        tracing::debug!(
            "Routing message: type={}, id={:?}",
            message.kind,
            message.id
        );

        let payload = match message.payload() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(
                    "Dropping '{}' message with unexpected data: {}",
                    message.kind,
                    e
                );
                return;
            }
        };

        match payload {
            Payload::Notification(data) => self.notifier.show(Toast::from_notification(&data)),
            Payload::DocumentUpdate(update) => {
                self.notifier.show(Toast::from_document_update(&update))
            }
            Payload::UserUpdate(update) => self.notifier.show(Toast::from_user_update(&update)),
            Payload::SystemAlert(alert) => self.notifier.show(Toast::from_system_alert(&alert)),
            Payload::RealTimeData(_) => {}
            Payload::Pong => tracing::debug!("Received pong"),
            Payload::Control(data) => self.log_control(&message.kind, &data),
            Payload::Unknown(_) => tracing::info!("Unknown message type: {}", message.kind),
        }

        self.handlers
            .emit(message.kind.as_str(), &message.event_data());
    }

    fn log_control(&self, kind: &MessageKind, data: &serde_json::Value) {
        match kind {
            MessageKind::Control(ControlKind::Error) => {
                tracing::warn!("Realtime server reported an error: {}", data)
            }
            _ => tracing::info!("Realtime server: {} {}", kind, data),
        }
    }
}
