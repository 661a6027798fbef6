// Use-case level inputs/outputs for the replicated model.

use crate::domain::{MovementState, MovingPlatform, PlayerState, Vec2, ViewId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Milliseconds on the session's shared logical clock.
pub type LogicalTime = u64;

/// Player records keyed by id. Ordered so every replica emits identical payloads.
pub type PlayerMap = BTreeMap<ViewId, PlayerState>;

/// Events published by views and delivered, in reflector order, to every model replica.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    ViewJoin { view_id: ViewId },
    ViewExit { view_id: ViewId },
    PlayerMoved(PlayerMove),
    GoalReached { player_id: ViewId },
    SetUsername { player_id: ViewId, username: String },
    SetCharacterVariant { player_id: ViewId, variant: u8 },
}

/// Last-write-wins movement update from the player's own view.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerMove {
    pub player_id: ViewId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub movement_state: MovementState,
    pub facing_left: bool,
}

/// Notifications the model publishes to its local views.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelEvent {
    PlayerJoined { player_id: ViewId, players: PlayerMap },
    PlayerLeft { player_id: ViewId, players: PlayerMap },
    PlayerUpdated { player_id: ViewId, players: PlayerMap },
    GameOver { winner_id: ViewId, winner_number: u32 },
    GameReset { players: PlayerMap },
    PlatformsUpdated { platforms: Vec<MovingPlatform> },
}

impl ModelEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ModelEvent::PlayerJoined { .. } => "player-joined",
            ModelEvent::PlayerLeft { .. } => "player-left",
            ModelEvent::PlayerUpdated { .. } => "player-updated",
            ModelEvent::GameOver { .. } => "game-over",
            ModelEvent::GameReset { .. } => "game-reset",
            ModelEvent::PlatformsUpdated { .. } => "platforms-updated",
        }
    }
}

/// Deferred calls the model schedules on itself through the logical clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ModelCall {
    ResetGame,
    UpdatePlatforms,
}

/// Port the model uses to reach the replicated session it runs in.
///
/// Implementations must fire scheduled calls in the same order on every replica;
/// real-time precision is not required.
pub trait ModelContext {
    fn now(&self) -> LogicalTime;
    fn future(&mut self, delay_ms: u64, call: ModelCall);
    fn publish(&mut self, event: ModelEvent);
}
