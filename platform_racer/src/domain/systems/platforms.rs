use crate::domain::state::{MovingPlatform, PlatformSlot};
use crate::domain::tuning::platform::PlatformTuning;
use rand::Rng;

/// Advances one platform by `dt_ms` logical milliseconds, bouncing at the travel bounds.
pub fn advance_platform(p: &mut MovingPlatform, dt_ms: f32) {
    p.current_x += p.direction * p.speed * dt_ms;

    if p.current_x >= p.max_x() {
        p.current_x = p.max_x();
        p.direction = -1.0;
    } else if p.current_x <= p.min_x() {
        p.current_x = p.min_x();
        p.direction = 1.0;
    }

    debug_assert!(p.within_bounds(), "platform {} left its travel range", p.slot_index);
}

pub fn advance_platforms(platforms: &mut [MovingPlatform], dt_ms: f32) {
    for p in platforms.iter_mut() {
        advance_platform(p, dt_ms);
    }
}

/// Draws `wanted` distinct slot indices uniformly, rejecting repeated draws.
///
/// Asking for more slots than exist yields every slot once rather than looping forever.
pub fn select_moving_slots<R: Rng + ?Sized>(rng: &mut R, slot_count: usize, wanted: usize) -> Vec<usize> {
    let wanted = wanted.min(slot_count);
    let mut selected = Vec::with_capacity(wanted);
    while selected.len() < wanted {
        let index = rng.random_range(0..slot_count);
        if !selected.contains(&index) {
            selected.push(index);
        }
    }
    selected
}

/// Builds a fresh set of moving platforms from a random subset of `slots`.
pub fn spawn_moving_platforms<R: Rng + ?Sized>(
    rng: &mut R,
    slots: &[PlatformSlot],
    tuning: PlatformTuning,
) -> Vec<MovingPlatform> {
    select_moving_slots(rng, slots.len(), tuning.moving_count)
        .into_iter()
        .map(|index| {
            MovingPlatform::from_slot(index, slots[index], tuning.speed, tuning.travel_distance)
        })
        .collect()
}
