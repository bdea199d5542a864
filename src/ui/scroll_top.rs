//! "Back to top" button.
//!
//! Tracks the last vertical offset reported by a [`ScrollSource`]. Visible
//! for any nonzero offset; activating it smooth-scrolls the viewport to 0.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde::Serialize;
use tracing::debug;

use super::viewport::{ListenerId, ListenerOptions, ScrollBehavior, ScrollSource, Viewport};

pub const ARIA_LABEL: &str = "Back to top";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonVariant {
    Invisible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonSize {
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Icon {
    ChevronUp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ButtonStyle {
    pub color: &'static str,
    pub line_height: &'static str,
}

/// What the renderer should draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IconButton {
    pub variant: ButtonVariant,
    pub aria_label: &'static str,
    pub icon: Icon,
    pub size: ButtonSize,
    pub sx: ButtonStyle,
}

/// A registered listener together with the source it lives on.
struct Subscription {
    source: Rc<dyn ScrollSource>,
    id: ListenerId,
}

impl Subscription {
    fn is(&self, source: &Rc<dyn ScrollSource>, id: ListenerId) -> bool {
        // Compare data pointers only; vtable pointers may differ per codegen unit.
        self.id == id
            && Rc::as_ptr(&self.source) as *const () == Rc::as_ptr(source) as *const ()
    }
}

#[derive(Default)]
pub struct GoToTopButton {
    offset: Rc<Cell<f64>>,
    listener: Rc<RefCell<Option<Subscription>>>,
}

impl GoToTopButton {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset(&self) -> f64 {
        self.offset.get()
    }

    /// Subscribe to `source`. The returned handle unsubscribes when dropped.
    ///
    /// A listener left by a previous mount of this button is removed first,
    /// so there is never more than one.
    pub fn mount(&self, source: Rc<dyn ScrollSource>) -> MountedButton {
        let stale = self.listener.borrow_mut().take();
        if let Some(stale) = stale {
            stale.source.remove_scroll_listener(stale.id);
        }

        let offset = Rc::clone(&self.offset);
        let id = source.add_scroll_listener(
            Rc::new(move |y| offset.set(y)),
            ListenerOptions { passive: true },
        );
        *self.listener.borrow_mut() = Some(Subscription {
            source: Rc::clone(&source),
            id,
        });
        debug!(?id, "scroll-to-top mounted");

        MountedButton {
            source,
            id: Some(id),
            current: Rc::clone(&self.listener),
        }
    }

    /// Nothing at offset zero, the button otherwise.
    pub fn render(&self) -> Option<IconButton> {
        if self.offset.get() == 0.0 {
            return None;
        }
        Some(IconButton {
            variant: ButtonVariant::Invisible,
            aria_label: ARIA_LABEL,
            icon: Icon::ChevronUp,
            size: ButtonSize::Large,
            sx: ButtonStyle {
                color: "fg.subtle",
                line_height: "18px",
            },
        })
    }

    /// Click handler.
    pub fn activate(&self, viewport: &dyn Viewport) {
        viewport.set_scroll_behavior(ScrollBehavior::Smooth);
        viewport.set_scroll_top(0.0);
        debug!("scroll-to-top activated");
    }
}

/// Live subscription of a mounted [`GoToTopButton`].
pub struct MountedButton {
    source: Rc<dyn ScrollSource>,
    id: Option<ListenerId>,
    current: Rc<RefCell<Option<Subscription>>>,
}

impl MountedButton {
    pub fn unmount(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        let Some(id) = self.id.take() else { return };
        self.source.remove_scroll_listener(id);
        let mut current = self.current.borrow_mut();
        if current.as_ref().is_some_and(|sub| sub.is(&self.source, id)) {
            *current = None;
        }
        debug!(?id, "scroll-to-top unmounted");
    }
}

impl Drop for MountedButton {
    fn drop(&mut self) {
        self.teardown();
    }
}
