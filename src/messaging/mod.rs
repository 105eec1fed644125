// Messaging module - Inbound message model, routing and fan-out
pub mod event;
pub mod handlers;
pub mod payload;
pub mod router;
pub mod toast;

pub use event::{ControlKind, MessageKind};
pub use handlers::{EventHandlerRegistry, Handler, HandlerId};
pub use payload::{
    DocumentRef, DocumentUpdate, NotificationData, Payload, SystemAlert, UserRef, UserUpdate,
};
pub use router::MessageRouter;
pub use toast::{Notifier, Toast, ToastLevel, TracingNotifier};
