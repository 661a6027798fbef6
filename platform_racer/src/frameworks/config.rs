use std::{env, time::Duration};

// Runtime/session constants (not gameplay tuning).

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Seed shared by every replica; the same seed yields the same platform layout.
pub fn session_seed() -> u64 {
    env_parse("SESSION_SEED").unwrap_or(42)
}

pub fn sim_peers() -> usize {
    env_parse("SIM_PEERS").unwrap_or(3)
}

pub fn sim_duration() -> Duration {
    Duration::from_millis(env_parse("SIM_DURATION_MS").unwrap_or(20_000))
}

pub fn frame_interval() -> Duration {
    Duration::from_millis(env_parse("FRAME_INTERVAL_MS").unwrap_or(1000 / 60))
}

pub const REFLECTOR_INPUT_CAPACITY: usize = 1024;
// Every replica reads every stamp, so this bounds how far a peer may fall behind.
pub const STREAM_BROADCAST_CAPACITY: usize = 4096;
pub const OBSERVER_BROADCAST_CAPACITY: usize = 128;

pub const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub seed: u64,
    pub peers: usize,
    pub duration: Duration,
    pub frame_interval: Duration,
    pub heartbeat: Duration,
    pub reflector_input_capacity: usize,
    pub stream_capacity: usize,
    pub observer_capacity: usize,
}

impl SessionSettings {
    pub fn from_env() -> Self {
        Self {
            seed: session_seed(),
            peers: sim_peers(),
            duration: sim_duration(),
            frame_interval: frame_interval(),
            ..Self::default()
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            seed: 42,
            peers: 3,
            duration: Duration::from_secs(20),
            frame_interval: Duration::from_millis(1000 / 60),
            heartbeat: HEARTBEAT_INTERVAL,
            reflector_input_capacity: REFLECTOR_INPUT_CAPACITY,
            stream_capacity: STREAM_BROADCAST_CAPACITY,
            observer_capacity: OBSERVER_BROADCAST_CAPACITY,
        }
    }
}
