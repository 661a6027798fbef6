// Wire protocol DTOs and conversions for events carried by the replicated bus.
// Every message is `{"type": "<event-name>", "data": {...}}`.

use crate::domain::{MovementState, MovingPlatform, PlayerState, Vec2, ViewId};
use crate::use_cases::{ModelEvent, PlayerMap, PlayerMove, ViewEvent};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Event names views publish towards the model.
pub const VIEW_EVENT_NAMES: [&str; 6] = [
    "view-join",
    "view-exit",
    "player-moved",
    "goal-reached",
    "set-username",
    "set-cat-type",
];

/// Event names the model publishes towards views.
pub const MODEL_EVENT_NAMES: [&str; 6] = [
    "player-joined",
    "player-left",
    "player-updated",
    "game-over",
    "game-reset",
    "platforms-updated",
];

/// Messages views publish; delivered to every model replica in reflector order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum ViewMessage {
    // Generated by the session itself when a view connects or disconnects.
    ViewJoin(ViewIdPayload),
    ViewExit(ViewIdPayload),
    PlayerMoved(PlayerMovedPayload),
    GoalReached(PlayerIdPayload),
    SetUsername(SetUsernamePayload),
    SetCatType(SetCatTypePayload),
}

/// Messages a model replica publishes to its views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum ModelMessage {
    PlayerJoined(RosterPayload),
    PlayerLeft(RosterPayload),
    PlayerUpdated(RosterPayload),
    GameOver(GameOverPayload),
    GameReset(GameResetPayload),
    PlatformsUpdated(PlatformsPayload),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewIdPayload {
    pub view_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerIdPayload {
    pub player_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VelocityDto {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
}

/// Movement relay payload. Applied verbatim by every replica.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerMovedPayload {
    pub player_id: String,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub velocity: VelocityDto,
    #[serde(default)]
    pub state: MovementState,
    #[serde(default)]
    pub facing_left: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetUsernamePayload {
    pub player_id: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetCatTypePayload {
    pub player_id: String,
    pub cat_type: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterPayload {
    pub player_id: String,
    pub players: BTreeMap<String, PlayerStateDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameOverPayload {
    pub winner_id: String,
    pub winner_number: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResetPayload {
    pub players: BTreeMap<String, PlayerStateDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformsPayload {
    pub platforms: Vec<PlatformDto>,
}

/// Flattened player record for wire transmission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStateDto {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub velocity: VelocityDto,
    pub state: MovementState,
    pub facing_left: bool,
    pub score: u32,
    pub player_number: u32,
    pub username: Option<String>,
    pub cat_type: Option<u8>,
}

/// Flattened moving platform for wire transmission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformDto {
    pub index: usize,
    pub start_x: f32,
    pub x: f32,
    pub y: f32,
    pub direction: f32,
    pub speed: f32,
    pub distance: f32,
}

impl From<Vec2> for VelocityDto {
    fn from(v: Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

impl From<VelocityDto> for Vec2 {
    fn from(v: VelocityDto) -> Self {
        Vec2::new(v.x, v.y)
    }
}

impl From<&PlayerState> for PlayerStateDto {
    fn from(p: &PlayerState) -> Self {
        Self {
            id: p.id.to_string(),
            x: p.position.x,
            y: p.position.y,
            velocity: p.velocity.into(),
            state: p.movement_state,
            facing_left: p.facing_left,
            score: p.score,
            player_number: p.player_number,
            username: p.username.clone(),
            cat_type: p.character_variant,
        }
    }
}

impl From<PlayerStateDto> for PlayerState {
    fn from(p: PlayerStateDto) -> Self {
        Self {
            id: ViewId::from(p.id),
            position: Vec2::new(p.x, p.y),
            velocity: p.velocity.into(),
            movement_state: p.state,
            facing_left: p.facing_left,
            score: p.score,
            player_number: p.player_number,
            username: p.username,
            character_variant: p.cat_type,
        }
    }
}

impl From<&MovingPlatform> for PlatformDto {
    fn from(p: &MovingPlatform) -> Self {
        Self {
            index: p.slot_index,
            start_x: p.origin_x,
            x: p.current_x,
            y: p.y,
            direction: p.direction,
            speed: p.speed,
            distance: p.travel_distance,
        }
    }
}

impl From<PlatformDto> for MovingPlatform {
    fn from(p: PlatformDto) -> Self {
        Self {
            slot_index: p.index,
            origin_x: p.start_x,
            current_x: p.x,
            y: p.y,
            direction: p.direction,
            speed: p.speed,
            travel_distance: p.distance,
        }
    }
}

fn roster_to_dto(players: &PlayerMap) -> BTreeMap<String, PlayerStateDto> {
    players
        .iter()
        .map(|(id, p)| (id.to_string(), PlayerStateDto::from(p)))
        .collect()
}

fn roster_from_dto(players: BTreeMap<String, PlayerStateDto>) -> PlayerMap {
    players
        .into_iter()
        .map(|(id, p)| (ViewId::from(id), PlayerState::from(p)))
        .collect()
}

fn roster(player_id: &ViewId, players: &PlayerMap) -> RosterPayload {
    RosterPayload {
        player_id: player_id.to_string(),
        players: roster_to_dto(players),
    }
}

impl From<&ViewEvent> for ViewMessage {
    fn from(event: &ViewEvent) -> Self {
        match event {
            ViewEvent::ViewJoin { view_id } => ViewMessage::ViewJoin(ViewIdPayload {
                view_id: view_id.to_string(),
            }),
            ViewEvent::ViewExit { view_id } => ViewMessage::ViewExit(ViewIdPayload {
                view_id: view_id.to_string(),
            }),
            ViewEvent::PlayerMoved(update) => ViewMessage::PlayerMoved(PlayerMovedPayload {
                player_id: update.player_id.to_string(),
                x: update.position.x,
                y: update.position.y,
                velocity: update.velocity.into(),
                state: update.movement_state,
                facing_left: update.facing_left,
            }),
            ViewEvent::GoalReached { player_id } => ViewMessage::GoalReached(PlayerIdPayload {
                player_id: player_id.to_string(),
            }),
            ViewEvent::SetUsername {
                player_id,
                username,
            } => ViewMessage::SetUsername(SetUsernamePayload {
                player_id: player_id.to_string(),
                username: username.clone(),
            }),
            ViewEvent::SetCharacterVariant { player_id, variant } => {
                ViewMessage::SetCatType(SetCatTypePayload {
                    player_id: player_id.to_string(),
                    cat_type: *variant,
                })
            }
        }
    }
}

impl From<ViewMessage> for ViewEvent {
    fn from(message: ViewMessage) -> Self {
        match message {
            ViewMessage::ViewJoin(p) => ViewEvent::ViewJoin {
                view_id: p.view_id.into(),
            },
            ViewMessage::ViewExit(p) => ViewEvent::ViewExit {
                view_id: p.view_id.into(),
            },
            ViewMessage::PlayerMoved(p) => ViewEvent::PlayerMoved(PlayerMove {
                player_id: p.player_id.into(),
                position: Vec2::new(p.x, p.y),
                velocity: p.velocity.into(),
                movement_state: p.state,
                facing_left: p.facing_left,
            }),
            ViewMessage::GoalReached(p) => ViewEvent::GoalReached {
                player_id: p.player_id.into(),
            },
            ViewMessage::SetUsername(p) => ViewEvent::SetUsername {
                player_id: p.player_id.into(),
                username: p.username,
            },
            ViewMessage::SetCatType(p) => ViewEvent::SetCharacterVariant {
                player_id: p.player_id.into(),
                variant: p.cat_type,
            },
        }
    }
}

impl From<&ModelEvent> for ModelMessage {
    fn from(event: &ModelEvent) -> Self {
        match event {
            ModelEvent::PlayerJoined { player_id, players } => {
                ModelMessage::PlayerJoined(roster(player_id, players))
            }
            ModelEvent::PlayerLeft { player_id, players } => {
                ModelMessage::PlayerLeft(roster(player_id, players))
            }
            ModelEvent::PlayerUpdated { player_id, players } => {
                ModelMessage::PlayerUpdated(roster(player_id, players))
            }
            ModelEvent::GameOver {
                winner_id,
                winner_number,
            } => ModelMessage::GameOver(GameOverPayload {
                winner_id: winner_id.to_string(),
                winner_number: *winner_number,
            }),
            ModelEvent::GameReset { players } => ModelMessage::GameReset(GameResetPayload {
                players: roster_to_dto(players),
            }),
            ModelEvent::PlatformsUpdated { platforms } => {
                ModelMessage::PlatformsUpdated(PlatformsPayload {
                    platforms: platforms.iter().map(PlatformDto::from).collect(),
                })
            }
        }
    }
}

impl From<ModelMessage> for ModelEvent {
    fn from(message: ModelMessage) -> Self {
        match message {
            ModelMessage::PlayerJoined(p) => ModelEvent::PlayerJoined {
                player_id: p.player_id.into(),
                players: roster_from_dto(p.players),
            },
            ModelMessage::PlayerLeft(p) => ModelEvent::PlayerLeft {
                player_id: p.player_id.into(),
                players: roster_from_dto(p.players),
            },
            ModelMessage::PlayerUpdated(p) => ModelEvent::PlayerUpdated {
                player_id: p.player_id.into(),
                players: roster_from_dto(p.players),
            },
            ModelMessage::GameOver(p) => ModelEvent::GameOver {
                winner_id: p.winner_id.into(),
                winner_number: p.winner_number,
            },
            ModelMessage::GameReset(p) => ModelEvent::GameReset {
                players: roster_from_dto(p.players),
            },
            ModelMessage::PlatformsUpdated(p) => ModelEvent::PlatformsUpdated {
                platforms: p.platforms.into_iter().map(MovingPlatform::from).collect(),
            },
        }
    }
}
