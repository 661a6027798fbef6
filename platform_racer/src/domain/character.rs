// Movement state machine for the locally controlled character.
// Remote characters are puppeted from replicated state and never run through it.

use crate::domain::ports::CharacterBody;
use crate::domain::state::{MovementState, Vec2};
use crate::domain::tuning::player::CharacterTuning;
use std::time::Duration;
use tracing::debug;

/// Per-tick input after edge detection and jump buffering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CharacterInput {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

impl CharacterInput {
    pub fn is_moving(&self) -> bool {
        self.left || self.right || self.jump
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Animation {
    Idle,
    Walk,
    // Also used while falling.
    Jump,
}

/// Side effects the machine asks the body to perform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyCommand {
    SetVelocity(Vec2),
    SetVelocityX(f32),
    SetVelocityY(f32),
    // Direct position delta, bypassing the physics velocity channel.
    NudgeX(f32),
    FaceLeft(bool),
    PlayAnimation(Animation),
}

/// Everything the transition function reads for one tick.
#[derive(Debug, Clone, Copy)]
pub struct StepInput {
    pub input: CharacterInput,
    pub grounded: bool,
    pub velocity: Vec2,
    pub time_in_state: Duration,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Step {
    pub next: Option<MovementState>,
    pub commands: Vec<BodyCommand>,
}

impl Step {
    fn stay(commands: Vec<BodyCommand>) -> Self {
        Self {
            next: None,
            commands,
        }
    }

    fn go(next: MovementState) -> Self {
        Self {
            next: Some(next),
            commands: Vec::new(),
        }
    }
}

/// Evaluates one tick of `state`.
pub fn step(state: MovementState, ctx: &StepInput, tuning: &CharacterTuning) -> Step {
    match state {
        MovementState::Idle => {
            if !ctx.grounded {
                Step::go(MovementState::Falling)
            } else if ctx.input.jump {
                Step::go(MovementState::Jumping)
            } else if ctx.input.left || ctx.input.right {
                Step::go(MovementState::Walking)
            } else {
                Step::default()
            }
        }
        MovementState::Walking => {
            if !ctx.grounded {
                Step::go(MovementState::Falling)
            } else if ctx.input.jump {
                Step::go(MovementState::Jumping)
            } else if ctx.input.left {
                Step::stay(vec![
                    BodyCommand::SetVelocityX(-tuning.move_speed),
                    BodyCommand::FaceLeft(true),
                ])
            } else if ctx.input.right {
                Step::stay(vec![
                    BodyCommand::SetVelocityX(tuning.move_speed),
                    BodyCommand::FaceLeft(false),
                ])
            } else {
                Step::go(MovementState::Idle)
            }
        }
        MovementState::Jumping => {
            // Positive y is down: past the apex the character is falling.
            if ctx.velocity.y > 0.0 {
                Step::go(MovementState::Falling)
            } else if ctx.grounded && ctx.time_in_state >= tuning.min_jump_dwell {
                Step::go(MovementState::Idle)
            } else {
                Step::stay(air_steering(ctx.input, tuning))
            }
        }
        MovementState::Falling => {
            if ctx.grounded {
                Step::go(MovementState::Idle)
            } else {
                Step::stay(air_steering(ctx.input, tuning))
            }
        }
    }
}

fn air_steering(input: CharacterInput, tuning: &CharacterTuning) -> Vec<BodyCommand> {
    if input.left {
        vec![
            BodyCommand::NudgeX(-tuning.air_nudge()),
            BodyCommand::FaceLeft(true),
        ]
    } else if input.right {
        vec![
            BodyCommand::NudgeX(tuning.air_nudge()),
            BodyCommand::FaceLeft(false),
        ]
    } else {
        Vec::new()
    }
}

/// Commands issued when entering `state`.
pub fn enter_commands(state: MovementState, grounded: bool, tuning: &CharacterTuning) -> Vec<BodyCommand> {
    match state {
        MovementState::Idle => vec![
            BodyCommand::SetVelocity(Vec2::ZERO),
            BodyCommand::PlayAnimation(Animation::Idle),
        ],
        MovementState::Walking => vec![BodyCommand::PlayAnimation(Animation::Walk)],
        // Entering Jumping while airborne is a no-op entry.
        MovementState::Jumping if grounded => vec![
            BodyCommand::SetVelocityY(-tuning.jump_force),
            BodyCommand::PlayAnimation(Animation::Jump),
        ],
        MovementState::Jumping => Vec::new(),
        MovementState::Falling => vec![BodyCommand::PlayAnimation(Animation::Jump)],
    }
}

/// Commands issued when leaving `state`. None of the states need any yet.
pub fn exit_commands(state: MovementState) -> Vec<BodyCommand> {
    match state {
        MovementState::Idle
        | MovementState::Walking
        | MovementState::Jumping
        | MovementState::Falling => Vec::new(),
    }
}

pub fn apply_command<B: CharacterBody + ?Sized>(body: &mut B, command: BodyCommand) {
    match command {
        BodyCommand::SetVelocity(v) => body.set_velocity(v),
        BodyCommand::SetVelocityX(x) => {
            let v = body.velocity();
            body.set_velocity(Vec2::new(x, v.y));
        }
        BodyCommand::SetVelocityY(y) => {
            let v = body.velocity();
            body.set_velocity(Vec2::new(v.x, y));
        }
        BodyCommand::NudgeX(dx) => {
            let p = body.position();
            body.set_position(Vec2::new(p.x + dx, p.y));
        }
        BodyCommand::FaceLeft(left) => body.set_facing_left(left),
        BodyCommand::PlayAnimation(animation) => body.play_animation(animation),
    }
}

type StateListener = Box<dyn FnMut(MovementState) + Send>;

pub struct CharacterStateMachine {
    state: MovementState,
    time_in_state: Duration,
    tuning: CharacterTuning,
    listener: Option<StateListener>,
}

impl CharacterStateMachine {
    pub fn new(tuning: CharacterTuning) -> Self {
        Self {
            state: MovementState::Idle,
            time_in_state: Duration::ZERO,
            tuning,
            listener: None,
        }
    }

    pub fn state(&self) -> MovementState {
        self.state
    }

    pub fn tuning(&self) -> &CharacterTuning {
        &self.tuning
    }

    /// Registers a callback fired after every transition with the new state.
    pub fn on_state_change(&mut self, listener: impl FnMut(MovementState) + Send + 'static) {
        self.listener = Some(Box::new(listener));
    }

    /// Runs one tick. Returns the state entered this tick, if any.
    pub fn update<B: CharacterBody + ?Sized>(
        &mut self,
        input: CharacterInput,
        dt: Duration,
        body: &mut B,
    ) -> Option<MovementState> {
        self.time_in_state += dt;
        let ctx = StepInput {
            input,
            grounded: body.is_grounded(),
            velocity: body.velocity(),
            time_in_state: self.time_in_state,
        };

        let step = step(self.state, &ctx, &self.tuning);
        for command in step.commands {
            apply_command(body, command);
        }
        if let Some(next) = step.next {
            self.transition_to(next, body);
        }
        step.next
    }

    /// Leaves the current state and enters `next`, running exit then entry actions.
    pub fn transition_to<B: CharacterBody + ?Sized>(&mut self, next: MovementState, body: &mut B) {
        for command in exit_commands(self.state) {
            apply_command(body, command);
        }

        debug!(from = %self.state, to = %next, "movement transition");
        self.state = next;
        self.time_in_state = Duration::ZERO;

        for command in enter_commands(next, body.is_grounded(), &self.tuning) {
            apply_command(body, command);
        }

        if let Some(listener) = self.listener.as_mut() {
            listener(next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    const FRAME: Duration = Duration::from_millis(16);

    #[derive(Debug, Default)]
    struct TestBody {
        position: Vec2,
        velocity: Vec2,
        grounded: bool,
        facing_left: bool,
        animations: Vec<Animation>,
    }

    impl CharacterBody for TestBody {
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
        fn play_animation(&mut self, animation: Animation) {
            self.animations.push(animation);
        }
    }

    fn grounded_body() -> TestBody {
        TestBody {
            grounded: true,
            ..TestBody::default()
        }
    }

    fn input(left: bool, right: bool, jump: bool) -> CharacterInput {
        CharacterInput { left, right, jump }
    }

    fn ctx(input: CharacterInput, grounded: bool) -> StepInput {
        StepInput {
            input,
            grounded,
            velocity: Vec2::ZERO,
            time_in_state: Duration::ZERO,
        }
    }

    #[test]
    fn when_idle_and_jump_while_grounded_then_next_state_is_jumping() {
        let tuning = CharacterTuning::default();
        let result = step(MovementState::Idle, &ctx(input(false, false, true), true), &tuning);
        assert_eq!(result.next, Some(MovementState::Jumping));
    }

    #[test]
    fn when_ungrounded_then_idle_and_walking_fall_regardless_of_input() {
        let tuning = CharacterTuning::default();
        for state in [MovementState::Idle, MovementState::Walking] {
            for flags in [(false, false, false), (true, false, true), (false, true, true), (true, true, false)] {
                let result = step(state, &ctx(input(flags.0, flags.1, flags.2), false), &tuning);
                assert_eq!(result.next, Some(MovementState::Falling), "{state:?} {flags:?}");
            }
        }
    }

    #[test]
    fn when_idle_with_direction_held_then_walks() {
        let tuning = CharacterTuning::default();
        let result = step(MovementState::Idle, &ctx(input(true, false, false), true), &tuning);
        assert_eq!(result.next, Some(MovementState::Walking));
    }

    #[test]
    fn when_walking_left_then_velocity_and_facing_follow_input() {
        let mut machine = CharacterStateMachine::new(CharacterTuning::default());
        let mut body = grounded_body();
        body.velocity = Vec2::new(0.0, 3.0);

        machine.update(input(true, false, false), FRAME, &mut body);
        assert_eq!(machine.state(), MovementState::Walking);

        machine.update(input(true, false, false), FRAME, &mut body);
        assert_eq!(body.velocity, Vec2::new(-160.0, 3.0));
        assert!(body.facing_left);

        machine.update(input(false, true, false), FRAME, &mut body);
        assert_eq!(body.velocity.x, 160.0);
        assert!(!body.facing_left);
    }

    #[test]
    fn when_walking_without_direction_then_returns_to_idle_at_rest() {
        let mut machine = CharacterStateMachine::new(CharacterTuning::default());
        let mut body = grounded_body();
        machine.update(input(false, true, false), FRAME, &mut body);
        machine.update(input(false, true, false), FRAME, &mut body);

        let entered = machine.update(CharacterInput::default(), FRAME, &mut body);

        assert_eq!(entered, Some(MovementState::Idle));
        assert_eq!(body.velocity, Vec2::ZERO);
        assert_eq!(body.animations.last(), Some(&Animation::Idle));
    }

    #[test]
    fn when_jump_starts_on_ground_then_upward_impulse_is_applied() {
        let mut machine = CharacterStateMachine::new(CharacterTuning::default());
        let mut body = grounded_body();
        body.velocity = Vec2::new(0.0, 0.0);

        machine.update(input(false, false, true), FRAME, &mut body);

        assert_eq!(machine.state(), MovementState::Jumping);
        assert_eq!(body.velocity.y, -800.0);
        assert_eq!(body.animations.last(), Some(&Animation::Jump));
    }

    #[test]
    fn when_entering_jumping_while_airborne_then_entry_is_a_no_op() {
        let tuning = CharacterTuning::default();
        assert!(enter_commands(MovementState::Jumping, false, &tuning).is_empty());

        let mut machine = CharacterStateMachine::new(tuning);
        let mut body = TestBody::default();
        body.velocity = Vec2::new(5.0, -20.0);

        machine.transition_to(MovementState::Jumping, &mut body);

        assert_eq!(body.velocity, Vec2::new(5.0, -20.0));
        assert!(body.animations.is_empty());
    }

    #[test]
    fn when_grounded_right_after_launch_then_jump_is_not_cancelled() {
        let mut machine = CharacterStateMachine::new(CharacterTuning::default());
        let mut body = grounded_body();
        machine.update(input(false, false, true), FRAME, &mut body);

        // Physics has not lifted the body yet: still reports ground contact.
        machine.update(CharacterInput::default(), FRAME, &mut body);
        assert_eq!(machine.state(), MovementState::Jumping);

        for _ in 0..10 {
            machine.update(CharacterInput::default(), FRAME, &mut body);
        }
        assert_eq!(machine.state(), MovementState::Idle);
    }

    #[test]
    fn when_jump_passes_apex_then_falls() {
        let tuning = CharacterTuning::default();
        let mut c = ctx(CharacterInput::default(), false);
        c.velocity = Vec2::new(0.0, 1.0);
        assert_eq!(step(MovementState::Jumping, &c, &tuning).next, Some(MovementState::Falling));
    }

    #[test]
    fn when_airborne_with_direction_then_position_is_nudged_without_leaving_state() {
        let tuning = CharacterTuning::default();
        for state in [MovementState::Jumping, MovementState::Falling] {
            let mut c = ctx(input(false, true, false), false);
            c.velocity = Vec2::new(0.0, if state == MovementState::Jumping { -100.0 } else { 100.0 });
            let result = step(state, &c, &tuning);
            assert_eq!(result.next, None);
            assert_eq!(
                result.commands,
                vec![BodyCommand::NudgeX(160.0 / 60.0), BodyCommand::FaceLeft(false)]
            );
        }
    }

    #[test]
    fn when_falling_and_grounded_then_lands_in_idle() {
        let mut machine = CharacterStateMachine::new(CharacterTuning::default());
        let mut body = TestBody::default();
        machine.update(CharacterInput::default(), FRAME, &mut body);
        assert_eq!(machine.state(), MovementState::Falling);

        body.grounded = true;
        body.velocity = Vec2::new(40.0, 250.0);
        machine.update(CharacterInput::default(), FRAME, &mut body);

        assert_eq!(machine.state(), MovementState::Idle);
        assert_eq!(body.velocity, Vec2::ZERO);
    }

    #[test]
    fn when_transitioning_then_listener_receives_symbolic_names() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut machine = CharacterStateMachine::new(CharacterTuning::default());
        machine.on_state_change(move |state| {
            sink.lock().expect("listener mutex poisoned").push(state.as_str());
        });
        let mut body = grounded_body();

        machine.update(input(false, true, false), FRAME, &mut body);
        machine.update(input(false, true, true), FRAME, &mut body);
        body.grounded = false;
        body.velocity.y = 10.0;
        machine.update(CharacterInput::default(), FRAME, &mut body);

        let seen = seen.lock().expect("listener mutex poisoned");
        assert_eq!(*seen, vec!["walking", "jumping", "falling"]);
    }
}
