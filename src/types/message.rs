use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::messaging::{MessageKind, Payload};
use crate::types::Result;

/// A unit of data received from the realtime server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InboundMessage {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default)]
    pub data: Value,
    /// ISO string or epoch number, as the server sent it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
    /// Server-assigned identifier, string or number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Top-level fields outside the envelope (control messages put theirs here)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InboundMessage {
    pub fn new(kind: impl Into<MessageKind>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
            timestamp: None,
            id: None,
            extra: Map::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<Value>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<Value>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Value handed to subscribers: `data`, or the extra fields when a
    /// control message carries no `data`.
    pub fn event_data(&self) -> Value {
        if self.data.is_null() && !self.extra.is_empty() {
            Value::Object(self.extra.clone())
        } else {
            self.data.clone()
        }
    }

    /// Decodes `data` into the typed payload for this message's kind.
    pub fn payload(&self) -> Result<Payload> {
        let payload = match &self.kind {
            MessageKind::Notification => {
                Payload::Notification(decode_or_default(&self.data)?)
            }
            MessageKind::DocumentUpdate => {
                Payload::DocumentUpdate(serde_json::from_value(self.data.clone())?)
            }
            MessageKind::UserUpdate => {
                Payload::UserUpdate(serde_json::from_value(self.data.clone())?)
            }
            MessageKind::SystemAlert => Payload::SystemAlert(decode_or_default(&self.data)?),
            MessageKind::RealTimeData => Payload::RealTimeData(self.data.clone()),
            MessageKind::Pong => Payload::Pong,
            MessageKind::Control(_) => Payload::Control(self.event_data()),
            MessageKind::Unknown(_) => Payload::Unknown(self.data.clone()),
        };
        Ok(payload)
    }
}

fn decode_or_default<T>(data: &Value) -> Result<T>
where
    T: serde::de::DeserializeOwned + Default,
{
    if data.is_null() {
        return Ok(T::default());
    }
    Ok(serde_json::from_value(data.clone())?)
}
