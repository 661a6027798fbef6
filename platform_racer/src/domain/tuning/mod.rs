// Gameplay tuning shared by every replica. Never read from the environment:
// peers must agree on these values for the simulation to stay in lockstep.

pub mod platform;
pub mod player;
pub mod view;
pub mod world;
