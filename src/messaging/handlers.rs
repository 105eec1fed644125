use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Callback invoked with the `data` of an emitted event
pub type Handler = Arc<dyn Fn(&Value) + Send + Sync + 'static>;

/// Identifies a registration, used to remove it again with `off`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

/// Event name to callbacks mapping.
///
/// Registering the same `Arc` twice for one event is a no-op returning the first id.
/// A panicking callback is contained and logged, the remaining callbacks still run.
#[derive(Default)]
pub struct EventHandlerRegistry {
    handlers: Mutex<HashMap<String, Vec<(HandlerId, Handler)>>>,
    next_id: AtomicU64,
}

impl EventHandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, event: &str, handler: Handler) -> HandlerId {
        let mut handlers = self.handlers.lock();
        let bindings = handlers.entry(event.to_string()).or_default();

        if let Some((id, _)) = bindings
            .iter()
            .find(|(_, existing)| Arc::ptr_eq(existing, &handler))
        {
            return *id;
        }

        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        bindings.push((id, handler));
        id
    }

    pub fn off(&self, event: &str, id: HandlerId) {
        let mut handlers = self.handlers.lock();
        if let Some(bindings) = handlers.get_mut(event) {
            bindings.retain(|(existing, _)| *existing != id);
            if bindings.is_empty() {
                handlers.remove(event);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn handler_count(&self, event: &str) -> usize {
        self.handlers.lock().get(event).map_or(0, Vec::len)
    }

    /// Invokes every callback registered for `event`, in registration order.
    pub fn emit(&self, event: &str, data: &Value) {
        // Snapshot so callbacks may register or remove handlers themselves
        let snapshot: Vec<Handler> = {
            let handlers = self.handlers.lock();
            match handlers.get(event) {
                Some(bindings) => bindings.iter().map(|(_, h)| Arc::clone(h)).collect(),
                None => return,
            }
        };

        for handler in snapshot {
            if catch_unwind(AssertUnwindSafe(|| handler(data))).is_err() {
                tracing::error!("Error in event handler for '{}'", event);
            }
        }
    }
}
