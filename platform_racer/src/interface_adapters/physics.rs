// Headless arcade body: gravity, a floor, and one-way platforms.
// Stands in for the renderer's physics engine when peers run without a display.

use crate::domain::tuning::world::{GROUND_Y, PLATFORM_SLOTS, PLATFORM_WIDTH, WORLD_WIDTH};
use crate::domain::{Animation, CharacterBody, MovingPlatform, Vec2};
use std::time::Duration;

pub const GRAVITY: f32 = 1000.0;

/// Body whose `position` is the character's feet.
#[derive(Debug, Clone)]
pub struct ArcadeBody {
    position: Vec2,
    velocity: Vec2,
    facing_left: bool,
    grounded: bool,
    animation: Animation,
    moving: Vec<MovingPlatform>,
}

impl ArcadeBody {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            facing_left: false,
            grounded: position.y >= GROUND_Y,
            animation: Animation::Idle,
            moving: Vec::new(),
        }
    }

    pub fn animation(&self) -> Animation {
        self.animation
    }

    /// Replaces the moving platforms; their slots stop colliding at the slot origin.
    pub fn set_moving_platforms(&mut self, platforms: &[MovingPlatform]) {
        self.moving = platforms.to_vec();
    }

    // Walkable surfaces as (center x, top y).
    fn surfaces(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        let fixed = PLATFORM_SLOTS
            .iter()
            .enumerate()
            .filter(|(index, _)| !self.moving.iter().any(|p| p.slot_index == *index))
            .map(|(_, slot)| (slot.x, slot.y));
        let moving = self.moving.iter().map(|p| (p.current_x, p.y));
        fixed.chain(moving)
    }

    /// Advances the body by `dt`, landing on the highest surface crossed while falling.
    pub fn integrate(&mut self, dt: Duration) {
        let dt = dt.as_secs_f32();
        let previous_y = self.position.y;

        self.velocity.y += GRAVITY * dt;
        self.position.x = (self.position.x + self.velocity.x * dt).clamp(0.0, WORLD_WIDTH);
        self.position.y += self.velocity.y * dt;
        self.grounded = false;

        if self.velocity.y < 0.0 {
            return;
        }

        let half_width = PLATFORM_WIDTH / 2.0;
        let x = self.position.x;
        let landing = self
            .surfaces()
            .filter(|(cx, top)| {
                (x - cx).abs() <= half_width && previous_y <= *top && self.position.y >= *top
            })
            .map(|(_, top)| top)
            .chain((self.position.y >= GROUND_Y).then_some(GROUND_Y))
            .reduce(f32::min);

        if let Some(top) = landing {
            self.position.y = top;
            self.velocity.y = 0.0;
            self.grounded = true;
        }
    }
}

impl CharacterBody for ArcadeBody {
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
        self.animation = animation;
    }
}
