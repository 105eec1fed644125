use crate::types::constants::message_types;
use serde::{Deserialize, Serialize};

/// Type-safe inbound message kinds
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageKind {
    /// User-facing notification pushed by the server
    Notification,

    /// A document was created, updated, approved or rejected
    DocumentUpdate,

    /// A user's status or role changed
    UserUpdate,

    /// System-wide alert with a severity
    SystemAlert,

    /// Live dashboard data (analytics, metrics)
    RealTimeData,

    /// Heartbeat reply
    Pong,

    /// Server control messages
    Control(ControlKind),

    /// Anything else, kept verbatim
    Unknown(String),
}

impl MessageKind {
    /// Parse a wire type string into a MessageKind
    pub fn parse(s: &str) -> Self {
        match s {
            message_types::NOTIFICATION => Self::Notification,
            message_types::DOCUMENT_UPDATE => Self::DocumentUpdate,
            message_types::USER_UPDATE => Self::UserUpdate,
            message_types::SYSTEM_ALERT => Self::SystemAlert,
            message_types::REAL_TIME_DATA => Self::RealTimeData,
            message_types::PONG => Self::Pong,
            _ => match ControlKind::parse(s) {
                Some(control) => Self::Control(control),
                None => Self::Unknown(s.to_string()),
            },
        }
    }

    /// Convert kind to its wire string
    pub fn as_str(&self) -> &str {
        match self {
            Self::Notification => message_types::NOTIFICATION,
            Self::DocumentUpdate => message_types::DOCUMENT_UPDATE,
            Self::UserUpdate => message_types::USER_UPDATE,
            Self::SystemAlert => message_types::SYSTEM_ALERT,
            Self::RealTimeData => message_types::REAL_TIME_DATA,
            Self::Pong => message_types::PONG,
            Self::Control(control) => control.as_str(),
            Self::Unknown(s) => s,
        }
    }
}

impl From<&str> for MessageKind {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for MessageKind {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<MessageKind> for String {
    fn from(kind: MessageKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Control messages sent by the realtime server outside the notification flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    /// Token accepted, session bound to a user
    ConnectionEstablished,

    /// Server-side error (invalid or missing token, ...)
    Error,

    /// Channel subscription confirmed
    Subscribed,

    /// Channel unsubscription confirmed
    Unsubscribed,
}

impl ControlKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            message_types::CONNECTION_ESTABLISHED => Some(Self::ConnectionEstablished),
            message_types::ERROR => Some(Self::Error),
            message_types::SUBSCRIBED => Some(Self::Subscribed),
            message_types::UNSUBSCRIBED => Some(Self::Unsubscribed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConnectionEstablished => message_types::CONNECTION_ESTABLISHED,
            Self::Error => message_types::ERROR,
            Self::Subscribed => message_types::SUBSCRIBED,
            Self::Unsubscribed => message_types::UNSUBSCRIBED,
        }
    }
}
