//! Application-level window events and the observer registry.

use std::collections::HashMap;
use std::rc::Rc;

/// Tag identifying a class of window events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Closed,
    Ready,
    Resize,
    Move,
    Focus,
    Blur,
}

/// An event delivered to registered observers.
#[derive(Debug, Clone)]
pub enum WindowEvent {
    /// The window pair has been torn down.
    Closed,
    /// A content load completed.
    Ready,
    /// The embedded surface was resized.
    Resized { width: u32, height: u32 },
    /// The embedded surface moved.
    Moved { x: i32, y: i32 },
    Focused,
    Blurred,
}

impl WindowEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            WindowEvent::Closed => EventKind::Closed,
            WindowEvent::Ready => EventKind::Ready,
            WindowEvent::Resized { .. } => EventKind::Resize,
            WindowEvent::Moved { .. } => EventKind::Move,
            WindowEvent::Focused => EventKind::Focus,
            WindowEvent::Blurred => EventKind::Blur,
        }
    }
}

/// Observer callback; invoked on the scheduler thread.
pub type ObserverCallback = Rc<dyn Fn(&WindowEvent)>;

/// Ordered per-tag observer lists.
///
/// Delivery order is subscription order. Subscribing the same callback twice
/// delivers it twice; there is no deduplication.
#[derive(Default)]
pub struct ObserverRegistry {
    observers: HashMap<EventKind, Vec<ObserverCallback>>,
}

impl ObserverRegistry {
    pub fn subscribe(&mut self, kind: EventKind, callback: ObserverCallback) {
        self.observers.entry(kind).or_default().push(callback);
    }

    /// Clone out the current subscriber list so callbacks can run without
    /// holding any borrow of the registry.
    pub fn snapshot(&self, kind: EventKind) -> Vec<ObserverCallback> {
        self.observers.get(&kind).map(|v| v.to_vec()).unwrap_or_default()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.observers.get(&kind).map(|v| v.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_event_kind_mapping() {
        assert_eq!(WindowEvent::Closed.kind(), EventKind::Closed);
        assert_eq!(WindowEvent::Ready.kind(), EventKind::Ready);
        assert_eq!(
            WindowEvent::Resized {
                width: 1,
                height: 2
            }
            .kind(),
            EventKind::Resize
        );
        assert_eq!(WindowEvent::Moved { x: 0, y: 0 }.kind(), EventKind::Move);
    }

    #[test]
    fn test_delivery_order_is_subscription_order() {
        let mut registry = ObserverRegistry::default();
        let order = Rc::new(RefCell::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let order = order.clone();
            registry.subscribe(
                EventKind::Resize,
                Rc::new(move |_| order.borrow_mut().push(tag)),
            );
        }

        for callback in registry.snapshot(EventKind::Resize) {
            callback(&WindowEvent::Resized {
                width: 10,
                height: 10,
            });
        }
        assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_no_deduplication() {
        let mut registry = ObserverRegistry::default();
        let hits = Rc::new(RefCell::new(0u32));

        let callback: ObserverCallback = {
            let hits = hits.clone();
            Rc::new(move |_| *hits.borrow_mut() += 1)
        };
        registry.subscribe(EventKind::Focus, callback.clone());
        registry.subscribe(EventKind::Focus, callback);

        for cb in registry.snapshot(EventKind::Focus) {
            cb(&WindowEvent::Focused);
        }
        assert_eq!(*hits.borrow(), 2);
    }

    #[test]
    fn test_snapshot_of_empty_kind() {
        let registry = ObserverRegistry::default();
        assert!(registry.snapshot(EventKind::Blur).is_empty());
        assert_eq!(registry.count(EventKind::Blur), 0);
    }
}
