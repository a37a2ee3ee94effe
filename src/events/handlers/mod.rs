// src/events/handlers/mod.rs
//
// Event Handlers
//
// Handlers use closure-based subscription via EventBus::subscribe.

pub mod progress_handler;

pub use progress_handler::{register_progress_handlers, RunProgress};
