// Domain layer: core simulation types and rules.

pub mod character;
pub mod ports;
pub mod state;
pub mod systems;
pub mod tuning;

pub use character::{Animation, BodyCommand, CharacterInput, CharacterStateMachine};
pub use ports::CharacterBody;
pub use state::{
    GoalState, MovementState, MovingPlatform, PlatformSlot, PlayerState, RoundState, Vec2, ViewId,
};
