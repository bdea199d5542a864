use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde::Serialize;

pub type ScrollListener = Rc<dyn Fn(f64)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollBehavior {
    #[default]
    Auto,
    Smooth,
}

/// Registration flags for a scroll listener.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListenerOptions {
    /// The listener never blocks scrolling.
    pub passive: bool,
}

/// Source of vertical scroll notifications.
pub trait ScrollSource {
    fn scroll_y(&self) -> f64;
    fn add_scroll_listener(&self, listener: ScrollListener, options: ListenerOptions) -> ListenerId;
    /// Returns false when `id` was not registered.
    fn remove_scroll_listener(&self, id: ListenerId) -> bool;
}

/// Document-level scroll controls.
pub trait Viewport {
    fn set_scroll_behavior(&self, behavior: ScrollBehavior);
    fn set_scroll_top(&self, top: f64);
}

/// Single-threaded in-process page: holds the scroll offset, the document
/// scroll behavior and the registered listeners.
#[derive(Default)]
pub struct ScrollViewport {
    scroll_y: Cell<f64>,
    behavior: Cell<ScrollBehavior>,
    listeners: RefCell<Vec<(ListenerId, ListenerOptions, ScrollListener)>>,
    next_id: Cell<u64>,
}

impl ScrollViewport {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Move the page and notify every listener, like a user scroll would.
    pub fn scroll_to(&self, y: f64) {
        self.scroll_y.set(y);
        // Snapshot so listeners may (un)register while being notified.
        let listeners: Vec<ScrollListener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, _, l)| Rc::clone(l))
            .collect();
        for listener in listeners {
            listener(y);
        }
    }

    pub fn behavior(&self) -> ScrollBehavior {
        self.behavior.get()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn passive_listener_count(&self) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|(_, options, _)| options.passive)
            .count()
    }
}

impl ScrollSource for ScrollViewport {
    fn scroll_y(&self) -> f64 {
        self.scroll_y.get()
    }

    fn add_scroll_listener(&self, listener: ScrollListener, options: ListenerOptions) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, options, listener));
        id
    }

    fn remove_scroll_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(lid, _, _)| *lid != id);
        listeners.len() != before
    }
}

impl Viewport for ScrollViewport {
    fn set_scroll_behavior(&self, behavior: ScrollBehavior) {
        self.behavior.set(behavior);
    }

    fn set_scroll_top(&self, top: f64) {
        self.scroll_to(top);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listeners_receive_offsets_until_removed() {
        let page = ScrollViewport::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let id = page.add_scroll_listener(
            Rc::new(move |y| sink.borrow_mut().push(y)),
            ListenerOptions { passive: true },
        );
        assert_eq!(page.passive_listener_count(), 1);

        page.scroll_to(120.0);
        page.scroll_to(0.0);
        assert!(page.remove_scroll_listener(id));
        assert!(!page.remove_scroll_listener(id));
        page.scroll_to(50.0);

        assert_eq!(*seen.borrow(), vec![120.0, 0.0]);
        assert_eq!(page.scroll_y(), 50.0);
    }

    #[test]
    fn set_scroll_top_notifies_and_keeps_behavior() {
        let page = ScrollViewport::new();
        assert_eq!(page.behavior(), ScrollBehavior::Auto);
        page.set_scroll_behavior(ScrollBehavior::Smooth);
        page.set_scroll_top(0.0);
        assert_eq!(page.behavior(), ScrollBehavior::Smooth);
        assert_eq!(page.scroll_y(), 0.0);
    }
}
