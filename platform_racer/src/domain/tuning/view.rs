use std::time::Duration;

/// Per-peer presentation timings. These only affect the local view and are
/// allowed to use the local clock.
#[derive(Debug, Clone, Copy)]
pub struct ViewTuning {
    /// Countdown shown after a reset before movement is re-enabled.
    pub countdown: Duration,

    /// Idle time after which the view leaves the session.
    pub inactivity_timeout: Duration,

    /// How long before the timeout the player is warned.
    pub inactivity_warning: Duration,

    /// Speed (units per second) above which the body counts as active.
    pub activity_speed: f32,

    /// Distance from the goal at which the local player claims it.
    pub goal_reach_radius: f32,
}

impl Default for ViewTuning {
    fn default() -> Self {
        Self {
            countdown: Duration::from_secs(3),
            inactivity_timeout: Duration::from_secs(60),
            inactivity_warning: Duration::from_secs(3),
            activity_speed: 10.0,
            goal_reach_radius: 24.0,
        }
    }
}
