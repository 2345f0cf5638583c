//! REST backend for the taskboard multi-user task manager.

pub mod api;
pub mod config;

pub use api::{AppState, router};
pub use config::Config;
