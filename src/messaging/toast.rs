use super::payload::{DocumentUpdate, NotificationData, SystemAlert, UserUpdate};

/// Severity of a user-facing toast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Default,
    Info,
    Success,
    Warning,
    Error,
}

/// A transient, non-blocking notification for the UI layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
    pub description: Option<String>,
}

impl Toast {
    pub fn new(level: ToastLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn from_notification(data: &NotificationData) -> Self {
        let level = match data.level.as_deref() {
            Some("success") => ToastLevel::Success,
            Some("error") => ToastLevel::Error,
            Some("warning") => ToastLevel::Warning,
            _ => ToastLevel::Default,
        };
        Self::new(level, data.message.clone().unwrap_or_default())
            .with_description(data.title.clone())
    }

    pub fn from_document_update(update: &DocumentUpdate) -> Self {
        let title = update.document.title.as_deref().unwrap_or("untitled");
        let action = update.action.as_deref().unwrap_or("changed");
        let message = match action {
            "created" => format!("New document \"{}\" has been uploaded", title),
            // updated, approved, rejected and anything else read the same
            other => format!("Document \"{}\" has been {}", title, other),
        };
        Self::new(ToastLevel::Info, message)
    }

    pub fn from_user_update(update: &UserUpdate) -> Self {
        let name = update.user.name.as_deref().unwrap_or("unknown");
        let message = match update.action.as_deref() {
            Some("status_changed") => format!(
                "User {} status changed to {}",
                name,
                update.user.status.as_deref().unwrap_or("unknown")
            ),
            Some("role_changed") => format!(
                "User {} role changed to {}",
                name,
                update.user.role.as_deref().unwrap_or("unknown")
            ),
            other => format!("User {} has been {}", name, other.unwrap_or("changed")),
        };
        Self::new(ToastLevel::Info, message)
    }

    pub fn from_system_alert(alert: &SystemAlert) -> Self {
        let level = match alert.severity.as_deref() {
            Some("critical") => ToastLevel::Error,
            Some("warning") => ToastLevel::Warning,
            _ => ToastLevel::Info,
        };
        Self::new(level, alert.message.clone().unwrap_or_default())
            .with_description(alert.title.clone())
    }
}

/// The UI surface toasts are handed to
pub trait Notifier: Send + Sync {
    fn show(&self, toast: Toast);
}

/// Notifier that writes toasts to the log, for headless use
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn show(&self, toast: Toast) {
        let description = toast.description.as_deref().unwrap_or("");
        match toast.level {
            ToastLevel::Error => tracing::error!("[toast] {} {}", toast.message, description),
            ToastLevel::Warning => tracing::warn!("[toast] {} {}", toast.message, description),
            _ => tracing::info!("[toast] {} {}", toast.message, description),
        }
    }
}
