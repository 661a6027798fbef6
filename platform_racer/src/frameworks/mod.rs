// Frameworks layer: runtime bootstrap, configuration and the simulated peers.

pub mod bot;
pub mod config;
pub mod peer;
pub mod server;
