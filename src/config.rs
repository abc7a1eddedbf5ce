use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_UPDATE_CAPACITY: usize = 100;
const DEFAULT_STOP_GRACE_MS: u64 = 500;

/// Tuning for mixers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Capacity of the mixer update broadcast channel
    #[serde(default = "default_update_capacity")]
    pub update_capacity: usize,

    /// How long `Mixer::stop` waits for the event task, in milliseconds
    #[serde(default = "default_stop_grace_ms")]
    pub stop_grace_ms: u64,
}

impl Config {
    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            update_capacity: DEFAULT_UPDATE_CAPACITY,
            stop_grace_ms: DEFAULT_STOP_GRACE_MS,
        }
    }
}

fn default_update_capacity() -> usize {
    DEFAULT_UPDATE_CAPACITY
}

fn default_stop_grace_ms() -> u64 {
    DEFAULT_STOP_GRACE_MS
}
