//! User management backend plus a headless scroll-to-top control.

pub mod app;
pub mod config;
pub mod error;
pub mod state;
pub mod ui;
pub mod users;
