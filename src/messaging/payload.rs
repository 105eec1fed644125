use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Reads a display field, rendering numbers and booleans as text
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

/// `data` of a `notification` message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationData {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub message: Option<String>,
    /// `success` | `error` | `warning` | anything else
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub level: Option<String>,
}

/// Document reference carried by `document_update`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentRef {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
}

/// `data` of a `document_update` message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentUpdate {
    /// `created` | `updated` | `approved` | `rejected` | other
    #[serde(default, deserialize_with = "lenient_string")]
    pub action: Option<String>,
    pub document: DocumentRef,
}

/// User reference carried by `user_update`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserRef {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub role: Option<String>,
}

/// `data` of a `user_update` message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserUpdate {
    /// `status_changed` | `role_changed` | other
    #[serde(default, deserialize_with = "lenient_string")]
    pub action: Option<String>,
    pub user: UserRef,
}

/// `data` of a `system_alert` message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemAlert {
    /// `critical` | `warning` | anything else
    #[serde(default, deserialize_with = "lenient_string")]
    pub severity: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
}

/// Typed view over an inbound message's `data`
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Notification(NotificationData),
    DocumentUpdate(DocumentUpdate),
    UserUpdate(UserUpdate),
    SystemAlert(SystemAlert),
    RealTimeData(Value),
    Pong,
    Control(Value),
    Unknown(Value),
}
