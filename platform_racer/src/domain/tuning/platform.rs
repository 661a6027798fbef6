use serde::{Deserialize, Serialize};

/// Gameplay tuning for moving platforms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlatformTuning {
    /// Travel speed in units per logical millisecond.
    pub speed: f32,

    /// Maximum displacement from the origin in either direction.
    pub travel_distance: f32,

    /// Logical milliseconds between platform ticks.
    pub tick_period_ms: u64,

    /// How many slots become moving platforms each round.
    pub moving_count: usize,
}

impl Default for PlatformTuning {
    fn default() -> Self {
        Self {
            speed: 0.05,
            travel_distance: 100.0,
            tick_period_ms: 50,
            moving_count: 2,
        }
    }
}
