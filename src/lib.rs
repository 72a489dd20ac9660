// Public API for integration tests and the simulation binary

pub mod client;
pub mod codec;
pub mod config;
pub mod host;
pub mod mode;
pub mod protocol;
pub mod state;
pub mod transport;
pub mod types;

// Background listener and heartbeat tasks
pub mod broadcast;
