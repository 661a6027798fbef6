// Scripted input source for headless peers.

use crate::domain::Vec2;
use crate::domain::tuning::world::GOAL_POSITION;
use crate::use_cases::input::RawInput;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

/// Holds one random decision for a short while, mostly steering towards the goal.
#[derive(Debug, Clone)]
pub struct Bot {
    rng: ChaCha8Rng,
    held: RawInput,
    until: Duration,
}

impl Bot {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            held: RawInput::default(),
            until: Duration::ZERO,
        }
    }

    pub fn next_input(&mut self, now: Duration, position: Vec2) -> RawInput {
        if now >= self.until {
            self.held = self.choose(position);
            self.until = now + Duration::from_millis(self.rng.random_range(250..=900));
        }
        self.held
    }

    fn choose(&mut self, position: Vec2) -> RawInput {
        let toward_goal_left = position.x > GOAL_POSITION.x;
        let left = if self.rng.random_bool(0.3) {
            !toward_goal_left
        } else {
            toward_goal_left
        };
        RawInput {
            left,
            right: !left,
            jump: self.rng.random_bool(0.6),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_decision_is_fresh_then_it_is_held() {
        let mut bot = Bot::new(3);
        let at = Vec2::new(100.0, 500.0);

        let first = bot.next_input(Duration::ZERO, at);
        let again = bot.next_input(Duration::from_millis(200), at);

        assert_eq!(first, again);
        assert!(first.left != first.right);
    }

    #[test]
    fn when_seeds_match_then_bots_behave_the_same() {
        let mut a = Bot::new(8);
        let mut b = Bot::new(8);
        let at = Vec2::new(350.0, 600.0);

        for step in 0..40u64 {
            let now = Duration::from_millis(step * 100);
            assert_eq!(a.next_input(now, at), b.next_input(now, at));
        }
    }
}
