//! Headless UI components: state, render description and event wiring,
//! independent of any concrete renderer.

pub mod scroll_top;
pub mod viewport;

pub use scroll_top::{GoToTopButton, IconButton, MountedButton};
pub use viewport::{
    ListenerId, ListenerOptions, ScrollBehavior, ScrollListener, ScrollSource, ScrollViewport, Viewport,
};
