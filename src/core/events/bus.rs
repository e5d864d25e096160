use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use super::base::Event;


pub type EventHandler = Arc<dyn Fn(&Event) + Send + Sync>;


/// Signal dispatch. Handlers run inline, before the emitting operation returns.
pub struct EventBus {
    handlers: Arc<RwLock<HashMap<String, Vec<EventHandler>>>>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn register(&self, event_type: &str, handler: EventHandler) {
        let mut handlers = self.handlers.write().await;
        handlers
            .entry(event_type.to_string())
            .or_default()
            .push(handler);
        debug!("Registered handler for signal: {}", event_type);
    }

    pub async fn emit(&self, event: Event) {
        let handlers = self.handlers.read().await;

        if let Some(signal_handlers) = handlers.get(&event.event_type) {
            for handler in signal_handlers {
                handler(&event);
            }
        } else {
            debug!("No handlers for signal: {}", event.event_type);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, json};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_event_bus() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);

        let handler: EventHandler = Arc::new(move |event| {
            assert_eq!(event.table, "category");
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        bus.register("post_softdelete", handler).await;

        bus.emit(Event::new("post_softdelete", "category", json!(1), Map::new()))
            .await;
        bus.emit(Event::new("post_undelete", "category", json!(1), Map::new()))
            .await;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
