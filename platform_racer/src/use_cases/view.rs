// Per-peer view logic for the locally controlled player.

use super::input::{InputCollector, RawInput};
use super::types::{ModelEvent, PlayerMap, PlayerMove, ViewEvent};
use crate::domain::tuning::player::CharacterTuning;
use crate::domain::tuning::view::ViewTuning;
use crate::domain::tuning::world::{GOAL_POSITION, SPAWN_POINT};
use crate::domain::{
    CharacterBody, CharacterStateMachine, MovementState, MovingPlatform, Vec2, ViewId,
};
use rand::Rng;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Whether local movement is currently allowed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoundGate {
    Playing,
    RoundOver { local_winner: bool },
    // Movement resumes at `until`, from `spawn`.
    Countdown { until: Duration, spawn: Vec2 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InactivityStatus {
    Active,
    Warning,
    TimedOut,
}

#[derive(Debug, Clone)]
pub struct InactivityMonitor {
    timeout: Duration,
    warning: Duration,
    last_activity: Duration,
}

impl InactivityMonitor {
    pub fn new(tuning: &ViewTuning, now: Duration) -> Self {
        Self {
            timeout: tuning.inactivity_timeout,
            warning: tuning.inactivity_warning,
            last_activity: now,
        }
    }

    pub fn record(&mut self, now: Duration) {
        self.last_activity = now;
    }

    pub fn check(&self, now: Duration) -> InactivityStatus {
        let idle = now.saturating_sub(self.last_activity);
        if idle > self.timeout {
            InactivityStatus::TimedOut
        } else if idle > self.timeout.saturating_sub(self.warning) {
            InactivityStatus::Warning
        } else {
            InactivityStatus::Active
        }
    }
}

/// Outcome of one local frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Running,
    Gated,
    InactivityWarning,
    // The view should disconnect from the session.
    Exited,
}

pub struct LocalView {
    view_id: ViewId,
    username: Option<String>,
    character_variant: Option<u8>,
    machine: CharacterStateMachine,
    input: InputCollector,
    gate: RoundGate,
    inactivity: InactivityMonitor,
    tuning: ViewTuning,
    goal_claimed: bool,
    exited: bool,
    local_number: Option<u32>,
    remote_players: PlayerMap,
    platforms: Vec<MovingPlatform>,
    outbox: Vec<ViewEvent>,
}

impl LocalView {
    pub fn new(
        view_id: ViewId,
        username: Option<String>,
        character: CharacterTuning,
        tuning: ViewTuning,
        now: Duration,
    ) -> Self {
        Self {
            input: InputCollector::new(character.jump_buffer),
            machine: CharacterStateMachine::new(character),
            inactivity: InactivityMonitor::new(&tuning, now),
            view_id,
            username,
            character_variant: None,
            gate: RoundGate::Playing,
            tuning,
            goal_claimed: false,
            exited: false,
            local_number: None,
            remote_players: PlayerMap::new(),
            platforms: Vec::new(),
            outbox: Vec::new(),
        }
    }

    pub fn view_id(&self) -> &ViewId {
        &self.view_id
    }

    pub fn gate(&self) -> RoundGate {
        self.gate
    }

    pub fn movement_state(&self) -> MovementState {
        self.machine.state()
    }

    pub fn character_variant(&self) -> Option<u8> {
        self.character_variant
    }

    pub fn local_number(&self) -> Option<u32> {
        self.local_number
    }

    pub fn remote_players(&self) -> &PlayerMap {
        &self.remote_players
    }

    pub fn platforms(&self) -> &[MovingPlatform] {
        &self.platforms
    }

    /// Announces this view's skin and display name once the session is joined.
    pub fn start<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let variant = rng.random_range(1..=self.machine.tuning().variant_count);
        self.character_variant = Some(variant);
        self.outbox.push(ViewEvent::SetCharacterVariant {
            player_id: self.view_id.clone(),
            variant,
        });

        if let Some(username) = self.username.clone() {
            self.outbox.push(ViewEvent::SetUsername {
                player_id: self.view_id.clone(),
                username,
            });
        }
    }

    /// Runs one local frame against the body owned by the physics collaborator.
    pub fn frame<B: CharacterBody + ?Sized>(
        &mut self,
        raw: RawInput,
        now: Duration,
        dt: Duration,
        body: &mut B,
    ) -> FrameStatus {
        if self.exited {
            return FrameStatus::Exited;
        }

        if let RoundGate::Countdown { until, spawn } = self.gate {
            if now < until {
                return FrameStatus::Gated;
            }
            body.set_position(spawn);
            body.set_velocity(Vec2::ZERO);
            self.machine.transition_to(MovementState::Idle, body);
            self.inactivity.record(now);
            self.gate = RoundGate::Playing;
            debug!(view_id = %self.view_id, "countdown finished");
        }
        if self.gate != RoundGate::Playing {
            return FrameStatus::Gated;
        }

        let input = self
            .input
            .collect(raw, self.machine.state(), body.is_grounded(), now);
        self.machine.update(input, dt, body);

        let velocity = body.velocity();
        if input.is_moving()
            || velocity.x.abs() > self.tuning.activity_speed
            || velocity.y.abs() > self.tuning.activity_speed
        {
            self.inactivity.record(now);
        }

        let position = body.position();
        self.outbox.push(ViewEvent::PlayerMoved(PlayerMove {
            player_id: self.view_id.clone(),
            position,
            velocity,
            movement_state: self.machine.state(),
            facing_left: body.facing_left(),
        }));

        let reach = self.tuning.goal_reach_radius;
        if !self.goal_claimed && position.distance_sq(GOAL_POSITION) <= reach * reach {
            self.goal_claimed = true;
            self.outbox.push(ViewEvent::GoalReached {
                player_id: self.view_id.clone(),
            });
        }

        match self.inactivity.check(now) {
            InactivityStatus::Active => FrameStatus::Running,
            InactivityStatus::Warning => FrameStatus::InactivityWarning,
            InactivityStatus::TimedOut => {
                warn!(view_id = %self.view_id, "inactive for too long; leaving session");
                self.exited = true;
                FrameStatus::Exited
            }
        }
    }

    /// Consumes one event published by this peer's model replica.
    pub fn on_model_event(&mut self, event: &ModelEvent, now: Duration) {
        match event {
            ModelEvent::PlayerJoined { players, .. }
            | ModelEvent::PlayerLeft { players, .. }
            | ModelEvent::PlayerUpdated { players, .. } => self.refresh_players(players),
            ModelEvent::GameOver {
                winner_id,
                winner_number,
            } => {
                let local_winner = *winner_id == self.view_id;
                info!(view_id = %self.view_id, winner_number, local_winner, "round over");
                self.gate = RoundGate::RoundOver { local_winner };
            }
            ModelEvent::GameReset { players } => {
                let spawn = players
                    .get(&self.view_id)
                    .map_or(SPAWN_POINT, |p| p.position);
                self.gate = RoundGate::Countdown {
                    until: now + self.tuning.countdown,
                    spawn,
                };
                self.goal_claimed = false;
                self.refresh_players(players);
            }
            ModelEvent::PlatformsUpdated { platforms } => {
                self.platforms.clone_from(platforms);
            }
        }
    }

    /// Takes the events queued for the replicated bus.
    pub fn drain_outbound(&mut self) -> Vec<ViewEvent> {
        std::mem::take(&mut self.outbox)
    }

    fn refresh_players(&mut self, players: &PlayerMap) {
        self.local_number = players.get(&self.view_id).map(|p| p.player_number);
        self.remote_players = players
            .iter()
            .filter(|(id, _)| **id != self.view_id)
            .map(|(id, p)| (id.clone(), p.clone()))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PlayerState;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const FRAME: Duration = Duration::from_millis(16);

    #[derive(Debug, Default)]
    struct StubBody {
        position: Vec2,
        velocity: Vec2,
        grounded: bool,
        facing_left: bool,
    }

    impl CharacterBody for StubBody {
        fn position(&self) -> Vec2 {
            self.position
        }
        fn set_position(&mut self, position: Vec2) {
            self.position = position;
        }
        fn velocity(&self) -> Vec2 {
            self.velocity
        }
        fn set_velocity(&mut self, velocity: Vec2) {
            self.velocity = velocity;
        }
        fn is_grounded(&self) -> bool {
            self.grounded
        }
        fn facing_left(&self) -> bool {
            self.facing_left
        }
        fn set_facing_left(&mut self, facing_left: bool) {
            self.facing_left = facing_left;
        }
    }

    fn view(username: Option<&str>) -> LocalView {
        LocalView::new(
            ViewId::from("me"),
            username.map(str::to_string),
            CharacterTuning::default(),
            ViewTuning::default(),
            Duration::ZERO,
        )
    }

    fn body_at(position: Vec2) -> StubBody {
        StubBody {
            position,
            grounded: true,
            ..StubBody::default()
        }
    }

    fn right() -> RawInput {
        RawInput {
            right: true,
            ..RawInput::default()
        }
    }

    fn players(ids: &[&str]) -> PlayerMap {
        ids.iter()
            .enumerate()
            .map(|(i, id)| {
                let number = u32::try_from(i + 1).expect("small test roster");
                (ViewId::from(*id), PlayerState::spawn(ViewId::from(*id), number, SPAWN_POINT))
            })
            .collect()
    }

    #[test]
    fn when_view_starts_then_variant_and_username_are_announced() {
        let mut view = view(Some("whiskers"));
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        view.start(&mut rng);

        let events = view.drain_outbound();
        let variant = view.character_variant().expect("variant chosen");
        assert!((1..=5).contains(&variant));
        assert_eq!(
            events,
            vec![
                ViewEvent::SetCharacterVariant {
                    player_id: ViewId::from("me"),
                    variant,
                },
                ViewEvent::SetUsername {
                    player_id: ViewId::from("me"),
                    username: "whiskers".to_string(),
                },
            ]
        );
    }

    #[test]
    fn when_frame_runs_then_movement_is_published() {
        let mut view = view(None);
        let mut body = body_at(SPAWN_POINT);

        let status = view.frame(right(), Duration::from_secs(1), FRAME, &mut body);

        assert_eq!(status, FrameStatus::Running);
        match view.drain_outbound().as_slice() {
            [ViewEvent::PlayerMoved(update)] => {
                assert_eq!(update.player_id, ViewId::from("me"));
                assert_eq!(update.movement_state, MovementState::Walking);
                assert_eq!(update.position, SPAWN_POINT);
            }
            other => panic!("unexpected outbound events: {other:?}"),
        }
    }

    #[test]
    fn when_body_touches_goal_then_goal_is_claimed_once() {
        let mut view = view(None);
        let mut body = body_at(Vec2::new(GOAL_POSITION.x + 5.0, GOAL_POSITION.y));

        view.frame(RawInput::default(), Duration::from_secs(1), FRAME, &mut body);
        view.frame(RawInput::default(), Duration::from_secs(2), FRAME, &mut body);

        let claims = view
            .drain_outbound()
            .into_iter()
            .filter(|e| matches!(e, ViewEvent::GoalReached { .. }))
            .count();
        assert_eq!(claims, 1);
    }

    #[test]
    fn when_round_is_over_then_frames_are_gated_and_silent() {
        let mut view = view(None);
        let mut body = body_at(SPAWN_POINT);
        view.on_model_event(
            &ModelEvent::GameOver {
                winner_id: ViewId::from("other"),
                winner_number: 2,
            },
            Duration::from_secs(1),
        );

        let status = view.frame(right(), Duration::from_secs(1), FRAME, &mut body);

        assert_eq!(status, FrameStatus::Gated);
        assert_eq!(view.gate(), RoundGate::RoundOver { local_winner: false });
        assert!(view.drain_outbound().is_empty());
    }

    #[test]
    fn when_reset_countdown_finishes_then_body_returns_to_spawn_in_idle() {
        let mut view = view(None);
        let mut body = body_at(Vec2::new(250.0, 90.0));
        body.velocity = Vec2::new(160.0, 0.0);
        view.frame(right(), Duration::from_secs(1), FRAME, &mut body);
        view.on_model_event(
            &ModelEvent::GameReset {
                players: players(&["me", "other"]),
            },
            Duration::from_secs(2),
        );
        view.drain_outbound();

        let early = view.frame(right(), Duration::from_millis(4900), FRAME, &mut body);
        assert_eq!(early, FrameStatus::Gated);

        let status = view.frame(RawInput::default(), Duration::from_secs(5), FRAME, &mut body);

        assert_eq!(status, FrameStatus::Running);
        assert_eq!(body.position, SPAWN_POINT);
        assert_eq!(body.velocity, Vec2::ZERO);
        assert_eq!(view.movement_state(), MovementState::Idle);
        assert_eq!(view.gate(), RoundGate::Playing);
    }

    #[test]
    fn when_idle_for_too_long_then_view_warns_then_exits() {
        let mut view = view(None);
        let mut body = body_at(SPAWN_POINT);

        let warned = view.frame(RawInput::default(), Duration::from_secs(58), FRAME, &mut body);
        let exited = view.frame(RawInput::default(), Duration::from_secs(61), FRAME, &mut body);

        assert_eq!(warned, FrameStatus::InactivityWarning);
        assert_eq!(exited, FrameStatus::Exited);
        assert_eq!(
            view.frame(right(), Duration::from_secs(62), FRAME, &mut body),
            FrameStatus::Exited
        );
    }

    #[test]
    fn when_roster_changes_then_only_remote_players_are_puppeted() {
        let mut view = view(None);
        view.on_model_event(
            &ModelEvent::PlayerJoined {
                player_id: ViewId::from("other"),
                players: players(&["me", "other"]),
            },
            Duration::ZERO,
        );

        assert_eq!(view.local_number(), Some(1));
        assert_eq!(view.remote_players().len(), 1);
        assert!(view.remote_players().contains_key(&ViewId::from("other")));
    }
}
