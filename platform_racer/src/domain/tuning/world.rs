// Level layout and round timing.

use crate::domain::state::{PlatformSlot, Vec2};

pub const SPAWN_POINT: Vec2 = Vec2::new(100.0, 500.0);
pub const GOAL_POSITION: Vec2 = Vec2::new(290.0, 70.0);

// Logical milliseconds between a win and the round reset.
pub const RESET_DELAY_MS: u64 = 1500;

pub const PLATFORM_SLOTS: [PlatformSlot; 12] = [
    PlatformSlot { x: 300.0, y: 500.0 },
    PlatformSlot { x: 100.0, y: 450.0 },
    PlatformSlot { x: 325.0, y: 400.0 },
    PlatformSlot { x: 75.0, y: 350.0 },
    PlatformSlot { x: 50.0, y: 300.0 },
    PlatformSlot { x: 280.0, y: 300.0 },
    PlatformSlot { x: 380.0, y: 250.0 },
    PlatformSlot { x: 50.0, y: 200.0 },
    PlatformSlot { x: 380.0, y: 200.0 },
    PlatformSlot { x: 75.0, y: 150.0 },
    PlatformSlot { x: 280.0, y: 100.0 },
    PlatformSlot { x: 30.0, y: 80.0 },
];

// Platform collision box width, used by the headless arcade body.
pub const PLATFORM_WIDTH: f32 = 120.0;
pub const GROUND_Y: f32 = 600.0;
pub const WORLD_WIDTH: f32 = 420.0;
