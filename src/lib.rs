// Library interface for mandi-live-server
// Exposes modules for integration testing

pub mod api;
pub mod bootstrap;
pub mod broadcaster;
pub mod config;
pub mod connection_registry;
pub mod directory;
pub mod events;
pub mod logging;
pub mod message_handler;
pub mod models;
pub mod simulator;
