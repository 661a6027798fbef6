// Domain-level replicated state: players, goal, round and moving platforms.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Session-scoped participant identifier handed out by the replicated session.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewId(String);

impl ViewId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ViewId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ViewId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_sq(self, other: Vec2) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// Movement state shared by the local state machine and the replicated player record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementState {
    #[default]
    Idle,
    Walking,
    Jumping,
    Falling,
}

impl MovementState {
    /// Symbolic name used on the wire and in state-change notifications.
    pub fn as_str(self) -> &'static str {
        match self {
            MovementState::Idle => "idle",
            MovementState::Walking => "walking",
            MovementState::Jumping => "jumping",
            MovementState::Falling => "falling",
        }
    }
}

impl fmt::Display for MovementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One record per connected participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub id: ViewId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub movement_state: MovementState,
    pub facing_left: bool,

    // Survives round resets.
    pub score: u32,
    pub player_number: u32,

    pub username: Option<String>,
    // Unset until the owning view publishes its skin choice.
    pub character_variant: Option<u8>,
}

impl PlayerState {
    pub fn spawn(id: ViewId, player_number: u32, at: Vec2) -> Self {
        Self {
            id,
            position: at,
            velocity: Vec2::ZERO,
            movement_state: MovementState::Idle,
            facing_left: false,
            score: 0,
            player_number,
            username: None,
            character_variant: None,
        }
    }

    /// Puts the player back at `at`, at rest. Score and identity are untouched.
    pub fn respawn(&mut self, at: Vec2) {
        self.position = at;
        self.velocity = Vec2::ZERO;
        self.movement_state = MovementState::Idle;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalState {
    pub position: Vec2,
}

/// Win/reset cycle. A winner exists exactly when the round is over.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RoundState {
    #[default]
    Playing,
    Over { winner_id: ViewId },
}

impl RoundState {
    pub fn is_over(&self) -> bool {
        matches!(self, RoundState::Over { .. })
    }

    pub fn winner_id(&self) -> Option<&ViewId> {
        match self {
            RoundState::Playing => None,
            RoundState::Over { winner_id } => Some(winner_id),
        }
    }
}

/// Static platform template position that may be swapped for a moving platform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlatformSlot {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingPlatform {
    pub slot_index: usize,
    pub origin_x: f32,
    pub current_x: f32,
    pub y: f32,
    // Signed unit multiplier: +1.0 moves right, -1.0 moves left.
    pub direction: f32,
    // Units per logical millisecond.
    pub speed: f32,
    pub travel_distance: f32,
}

impl MovingPlatform {
    pub fn from_slot(slot_index: usize, slot: PlatformSlot, speed: f32, travel_distance: f32) -> Self {
        Self {
            slot_index,
            origin_x: slot.x,
            current_x: slot.x,
            y: slot.y,
            direction: 1.0,
            speed,
            travel_distance,
        }
    }

    pub fn min_x(&self) -> f32 {
        self.origin_x - self.travel_distance
    }

    pub fn max_x(&self) -> f32 {
        self.origin_x + self.travel_distance
    }

    pub fn within_bounds(&self) -> bool {
        (self.min_x()..=self.max_x()).contains(&self.current_x)
    }
}
