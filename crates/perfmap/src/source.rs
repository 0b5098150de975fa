use crate::{error::SourceUnavailable, event::CodeEvent};
use educe::Educe;
use parking_lot::RwLock;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tracing::trace;

/// Invoked once per code event, synchronously, on the thread that produced
/// it. Must not block and must tolerate being re-entered.
pub type EventCallback = Arc<dyn Fn(&CodeEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Producer of code-lifecycle events, typically a runtime's JIT
/// instrumentation.
///
/// A subscription starts out disabled. Delivery for it runs between
/// [`enable`](EventSource::enable) and [`disable`](EventSource::disable).
/// [`unsubscribe`](EventSource::unsubscribe) releases it for good; the
/// source must drop its callback then.
pub trait EventSource: Send + Sync {
    fn subscribe(&self, on_event: EventCallback) -> Result<SubscriptionId, SourceUnavailable>;

    fn enable(&self, id: SubscriptionId);

    fn disable(&self, id: SubscriptionId);

    fn unsubscribe(&self, id: SubscriptionId);
}

#[derive(Educe)]
#[educe(Debug)]
struct Subscriber {
    id: SubscriptionId,
    enabled: bool,
    #[educe(Debug(ignore))]
    callback: EventCallback,
}

/// In-process [`EventSource`]. Whoever generates code calls
/// [`emit`](EventBus::emit).
#[derive(Debug, Default)]
pub struct EventBus {
    next_id: AtomicU64,
    subscribers: RwLock<Vec<Subscriber>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver an event to every enabled subscriber, in subscription order,
    /// on the calling thread.
    ///
    /// Callbacks run without any bus lock held, so they may emit further
    /// events or (un)subscribe.
    pub fn emit(&self, event: &CodeEvent) {
        let targets: Vec<EventCallback> = self
            .subscribers
            .read()
            .iter()
            .filter(|subscriber| subscriber.enabled)
            .map(|subscriber| Arc::clone(&subscriber.callback))
            .collect();

        trace!(kind = %event.kind, address = event.address, targets = targets.len(), "emit");
        for callback in targets {
            callback(event);
        }
    }

    /// Live subscriptions, enabled or not.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    pub fn is_enabled(&self, id: SubscriptionId) -> bool {
        self.subscribers
            .read()
            .iter()
            .any(|subscriber| subscriber.id == id && subscriber.enabled)
    }

    fn set_enabled(&self, id: SubscriptionId, enabled: bool) {
        if let Some(subscriber) = self
            .subscribers
            .write()
            .iter_mut()
            .find(|subscriber| subscriber.id == id)
        {
            subscriber.enabled = enabled;
        }
    }
}

impl EventSource for EventBus {
    fn subscribe(&self, on_event: EventCallback) -> Result<SubscriptionId, SourceUnavailable> {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.write().push(Subscriber {
            id,
            enabled: false,
            callback: on_event,
        });
        Ok(id)
    }

    fn enable(&self, id: SubscriptionId) {
        self.set_enabled(id, true);
    }

    fn disable(&self, id: SubscriptionId) {
        self.set_enabled(id, false);
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers
            .write()
            .retain(|subscriber| subscriber.id != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::CodeKind;
    use parking_lot::Mutex;

    fn recorder() -> (Arc<Mutex<Vec<u64>>>, EventCallback) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: EventCallback = Arc::new(move |event: &CodeEvent| {
            sink.lock().push(event.address);
        });
        (seen, callback)
    }

    #[test]
    fn delivers_only_while_enabled() {
        let bus = EventBus::new();
        let (seen, callback) = recorder();
        let id = bus.subscribe(callback).unwrap();

        bus.emit(&CodeEvent::new(CodeKind::Function, 1, 1));
        bus.enable(id);
        assert!(bus.is_enabled(id));
        bus.emit(&CodeEvent::new(CodeKind::Function, 2, 1));
        bus.emit(&CodeEvent::new(CodeKind::Function, 3, 1));
        bus.disable(id);
        bus.emit(&CodeEvent::new(CodeKind::Function, 4, 1));

        assert_eq!(*seen.lock(), [2, 3]);
    }

    #[test]
    fn subscriptions_are_independent() {
        let bus = EventBus::new();
        let (first, callback) = recorder();
        let a = bus.subscribe(callback).unwrap();
        let (second, callback) = recorder();
        let b = bus.subscribe(callback).unwrap();
        assert_ne!(a, b);

        bus.enable(a);
        bus.enable(b);
        bus.emit(&CodeEvent::new(CodeKind::Stub, 1, 1));
        bus.disable(a);
        bus.emit(&CodeEvent::new(CodeKind::Stub, 2, 1));

        assert_eq!(*first.lock(), [1]);
        assert_eq!(*second.lock(), [1, 2]);
    }

    #[test]
    fn unsubscribe_drops_the_callback() {
        let bus = EventBus::new();
        let (seen, callback) = recorder();
        let id = bus.subscribe(callback).unwrap();
        bus.enable(id);
        assert_eq!(bus.subscriber_count(), 1);

        bus.unsubscribe(id);
        bus.emit(&CodeEvent::new(CodeKind::Function, 1, 1));
        // unknown ids are ignored
        bus.unsubscribe(id);

        assert_eq!(bus.subscriber_count(), 0);
        assert!(!bus.is_enabled(id));
        assert!(seen.lock().is_empty());
        assert_eq!(Arc::strong_count(&seen), 1);
    }

    #[test]
    fn callback_may_emit_recursively() {
        let bus = Arc::new(EventBus::new());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let inner_bus = Arc::downgrade(&bus);
        let sink = Arc::clone(&seen);
        let id = bus
            .subscribe(Arc::new(move |event: &CodeEvent| {
                sink.lock().push(event.address);
                // compiling a stub while reporting a function
                if event.kind == CodeKind::Function
                    && let Some(bus) = inner_bus.upgrade()
                {
                    bus.emit(&CodeEvent::new(CodeKind::Stub, event.address + 1, 1));
                }
            }))
            .unwrap();
        bus.enable(id);

        bus.emit(&CodeEvent::new(CodeKind::Function, 10, 1));
        assert_eq!(*seen.lock(), [10, 11]);
    }
}
