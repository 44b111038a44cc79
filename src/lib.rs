// Public API for integration tests and the binary

pub mod commands;
pub mod config;
pub mod dispatch;
pub mod handlers;
pub mod messages;
pub mod polling;
pub mod state;
pub mod store;
pub mod transport;
pub mod types;
pub mod webhook;
