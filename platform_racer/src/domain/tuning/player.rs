use std::time::Duration;

/// Gameplay tuning for the locally controlled character.
///
/// Keep this separate from runtime configuration (frame rate, channel sizes, etc.).
#[derive(Debug, Clone, Copy)]
pub struct CharacterTuning {
    /// Horizontal walking speed in units per second.
    pub move_speed: f32,

    /// Upward impulse applied when a jump starts (applied as negative y velocity).
    pub jump_force: f32,

    /// Frames per second assumed for airborne horizontal nudging.
    pub tick_rate: f32,

    /// Time a jump must last before ground contact may end it.
    pub min_jump_dwell: Duration,

    /// Minimum interval between two accepted jump inputs.
    pub jump_buffer: Duration,

    /// Number of selectable character skins (numbered from 1).
    pub variant_count: u8,
}

impl CharacterTuning {
    /// Position delta applied per tick while steering in the air.
    pub fn air_nudge(&self) -> f32 {
        self.move_speed / self.tick_rate
    }
}

impl Default for CharacterTuning {
    fn default() -> Self {
        Self {
            move_speed: 160.0,
            jump_force: 800.0,
            tick_rate: 60.0,
            min_jump_dwell: Duration::from_millis(100),
            jump_buffer: Duration::from_millis(150),
            variant_count: 5,
        }
    }
}
