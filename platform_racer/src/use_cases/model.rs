// Replicated game model, mutated only by reflector-ordered view events and its own deferred calls.

use super::types::{
    LogicalTime, ModelCall, ModelContext, ModelEvent, PlayerMap, PlayerMove, ViewEvent,
};
use crate::domain::systems::platforms;
use crate::domain::tuning::platform::PlatformTuning;
use crate::domain::tuning::world::{GOAL_POSITION, PLATFORM_SLOTS, RESET_DELAY_MS, SPAWN_POINT};
use crate::domain::{GoalState, MovingPlatform, PlayerState, RoundState, ViewId};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameModel {
    players: PlayerMap,
    goal: GoalState,
    round: RoundState,
    moving_platforms: Vec<MovingPlatform>,
    last_platform_update: LogicalTime,
    // Monotonic so numbers are never reused after a leave.
    next_player_number: u32,
    platform_tuning: PlatformTuning,
    // Replicated RNG; lives in the model so snapshots carry its position.
    rng: ChaCha8Rng,
}

impl GameModel {
    /// Creates the model, picks the first moving platforms and arms the platform ticker.
    pub fn init<C: ModelContext + ?Sized>(seed: u64, ctx: &mut C) -> Self {
        Self::with_tuning(seed, PlatformTuning::default(), ctx)
    }

    pub fn with_tuning<C: ModelContext + ?Sized>(
        seed: u64,
        platform_tuning: PlatformTuning,
        ctx: &mut C,
    ) -> Self {
        let mut model = Self {
            players: PlayerMap::new(),
            goal: GoalState {
                position: GOAL_POSITION,
            },
            round: RoundState::Playing,
            moving_platforms: Vec::new(),
            last_platform_update: ctx.now(),
            next_player_number: 1,
            platform_tuning,
            rng: ChaCha8Rng::seed_from_u64(seed),
        };
        model.reset_moving_platforms(ctx);
        ctx.future(platform_tuning.tick_period_ms, ModelCall::UpdatePlatforms);
        model
    }

    pub fn players(&self) -> &PlayerMap {
        &self.players
    }

    pub fn player(&self, id: &ViewId) -> Option<&PlayerState> {
        self.players.get(id)
    }

    /// Players in display order.
    pub fn players_by_number(&self) -> Vec<&PlayerState> {
        let mut players: Vec<&PlayerState> = self.players.values().collect();
        players.sort_by_key(|p| p.player_number);
        players
    }

    pub fn goal(&self) -> &GoalState {
        &self.goal
    }

    pub fn round(&self) -> &RoundState {
        &self.round
    }

    pub fn moving_platforms(&self) -> &[MovingPlatform] {
        &self.moving_platforms
    }

    /// Routes one reflector-delivered event to its handler.
    pub fn handle_event<C: ModelContext + ?Sized>(&mut self, event: ViewEvent, ctx: &mut C) {
        match event {
            ViewEvent::ViewJoin { view_id } => self.on_join(view_id, ctx),
            ViewEvent::ViewExit { view_id } => self.on_leave(&view_id, ctx),
            ViewEvent::PlayerMoved(update) => self.on_move(update, ctx),
            ViewEvent::GoalReached { player_id } => self.on_goal_reached(&player_id, ctx),
            ViewEvent::SetUsername {
                player_id,
                username,
            } => self.on_set_username(&player_id, username, ctx),
            ViewEvent::SetCharacterVariant { player_id, variant } => {
                self.on_set_character_variant(&player_id, variant, ctx)
            }
        }
    }

    /// Runs a deferred call that came due on the logical clock.
    pub fn handle_call<C: ModelContext + ?Sized>(&mut self, call: ModelCall, ctx: &mut C) {
        match call {
            ModelCall::ResetGame => self.reset_game(ctx),
            ModelCall::UpdatePlatforms => self.update_platforms(ctx),
        }
    }

    pub fn on_join<C: ModelContext + ?Sized>(&mut self, view_id: ViewId, ctx: &mut C) {
        if self.players.contains_key(&view_id) {
            debug!(player_id = %view_id, "duplicate join ignored");
            return;
        }

        let player_number = self.next_player_number;
        self.next_player_number += 1;
        self.players.insert(
            view_id.clone(),
            PlayerState::spawn(view_id.clone(), player_number, SPAWN_POINT),
        );
        info!(player_id = %view_id, player_number, "player joined");

        ctx.publish(ModelEvent::PlayerJoined {
            player_id: view_id,
            players: self.players.clone(),
        });
    }

    pub fn on_leave<C: ModelContext + ?Sized>(&mut self, view_id: &ViewId, ctx: &mut C) {
        if self.players.remove(view_id).is_none() {
            return;
        }
        info!(player_id = %view_id, "player left");

        ctx.publish(ModelEvent::PlayerLeft {
            player_id: view_id.clone(),
            players: self.players.clone(),
        });
    }

    /// Overwrites the player's motion fields verbatim; the origin view is trusted.
    pub fn on_move<C: ModelContext + ?Sized>(&mut self, update: PlayerMove, ctx: &mut C) {
        let Some(player) = self.players.get_mut(&update.player_id) else {
            return;
        };
        player.position = update.position;
        player.velocity = update.velocity;
        player.movement_state = update.movement_state;
        player.facing_left = update.facing_left;

        self.publish_player_updated(update.player_id, ctx);
    }

    pub fn on_set_username<C: ModelContext + ?Sized>(
        &mut self,
        player_id: &ViewId,
        username: String,
        ctx: &mut C,
    ) {
        let Some(player) = self.players.get_mut(player_id) else {
            return;
        };
        player.username = Some(username);
        self.publish_player_updated(player_id.clone(), ctx);
    }

    pub fn on_set_character_variant<C: ModelContext + ?Sized>(
        &mut self,
        player_id: &ViewId,
        variant: u8,
        ctx: &mut C,
    ) {
        let Some(player) = self.players.get_mut(player_id) else {
            return;
        };
        player.character_variant = Some(variant);
        self.publish_player_updated(player_id.clone(), ctx);
    }

    /// First reacher wins; everything after that is ignored until the reset runs.
    pub fn on_goal_reached<C: ModelContext + ?Sized>(&mut self, player_id: &ViewId, ctx: &mut C) {
        if self.round.is_over() {
            debug!(player_id = %player_id, "goal reached after round end; ignored");
            return;
        }
        let Some(player) = self.players.get_mut(player_id) else {
            return;
        };

        player.score += 1;
        let winner_number = player.player_number;
        self.round = RoundState::Over {
            winner_id: player_id.clone(),
        };
        info!(player_id = %player_id, winner_number, score = player.score, "goal reached");

        ctx.publish(ModelEvent::GameOver {
            winner_id: player_id.clone(),
            winner_number,
        });
        ctx.future(RESET_DELAY_MS, ModelCall::ResetGame);
    }

    /// Starts a new round: everyone back to spawn, fresh moving platforms.
    pub fn reset_game<C: ModelContext + ?Sized>(&mut self, ctx: &mut C) {
        self.round = RoundState::Playing;
        for player in self.players.values_mut() {
            player.respawn(SPAWN_POINT);
        }
        self.reset_moving_platforms(ctx);
        info!(players = self.players.len(), "round reset");

        ctx.publish(ModelEvent::GameReset {
            players: self.players.clone(),
        });
    }

    /// Platform tick. Re-arms itself for the next period unconditionally.
    pub fn update_platforms<C: ModelContext + ?Sized>(&mut self, ctx: &mut C) {
        let now = ctx.now();
        let dt = now.saturating_sub(self.last_platform_update) as f32;
        platforms::advance_platforms(&mut self.moving_platforms, dt);
        self.last_platform_update = now;

        ctx.publish(ModelEvent::PlatformsUpdated {
            platforms: self.moving_platforms.clone(),
        });
        ctx.future(self.platform_tuning.tick_period_ms, ModelCall::UpdatePlatforms);
    }

    fn reset_moving_platforms<C: ModelContext + ?Sized>(&mut self, ctx: &mut C) {
        self.moving_platforms =
            platforms::spawn_moving_platforms(&mut self.rng, &PLATFORM_SLOTS, self.platform_tuning);
        debug!(
            slots = ?self.moving_platforms.iter().map(|p| p.slot_index).collect::<Vec<_>>(),
            "moving platforms selected"
        );

        ctx.publish(ModelEvent::PlatformsUpdated {
            platforms: self.moving_platforms.clone(),
        });
    }

    fn publish_player_updated<C: ModelContext + ?Sized>(&self, player_id: ViewId, ctx: &mut C) {
        ctx.publish(ModelEvent::PlayerUpdated {
            player_id,
            players: self.players.clone(),
        });
    }
}
