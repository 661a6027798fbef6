// Local input collection: turns held buttons into per-tick character input.
// Runs on the local clock only; nothing here is replicated.

use crate::domain::{CharacterInput, MovementState};
use std::time::Duration;

/// Raw held-button state from keyboard or touch controls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawInput {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

#[derive(Debug, Clone)]
pub struct InputCollector {
    jump_buffer: Duration,
    last_jump_at: Option<Duration>,
}

impl InputCollector {
    pub fn new(jump_buffer: Duration) -> Self {
        Self {
            jump_buffer,
            last_jump_at: None,
        }
    }

    /// Builds this tick's input. A held jump only counts when the character is on
    /// the ground, not already in the air, and the re-trigger interval has passed.
    pub fn collect(
        &mut self,
        raw: RawInput,
        state: MovementState,
        grounded: bool,
        now: Duration,
    ) -> CharacterInput {
        let airborne_state = matches!(state, MovementState::Jumping | MovementState::Falling);
        let buffer_elapsed = self
            .last_jump_at
            .is_none_or(|last| now.saturating_sub(last) >= self.jump_buffer);

        let jump = raw.jump && grounded && !airborne_state && buffer_elapsed;
        if jump {
            self.last_jump_at = Some(now);
        }

        CharacterInput {
            left: raw.left,
            right: raw.right,
            jump,
        }
    }
}
