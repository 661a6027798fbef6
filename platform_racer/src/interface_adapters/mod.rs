// Interface adapters: wire protocol, bus codec, reflector task and the headless body.

pub mod bus;
pub mod physics;
pub mod protocol;
pub mod reflector;
pub mod state;
pub mod utils;
