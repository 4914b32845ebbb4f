// src/cooldown.rs
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::landmarks::TriggerKey;

/// Per-key retrigger gate.
///
/// Keys are absent until they first fire; an absent key always fires. The
/// check and the update happen under one lock, so two hands racing on the
/// same key in the same frame authorize a single fire.
pub struct Debouncer {
    cooldown: Duration,
    last_fired: Mutex<HashMap<TriggerKey, Instant>>,
}

impl Debouncer {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_fired: Mutex::new(HashMap::new()),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Returns true and records `now` when `key` is out of cooldown.
    pub fn should_fire(&self, key: TriggerKey, now: Instant) -> bool {
        let mut last_fired = self.last_fired.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(last) = last_fired.get(&key) {
            if now.saturating_duration_since(*last) < self.cooldown {
                return false;
            }
        }

        last_fired.insert(key, now);
        true
    }

    pub fn last_fired(&self, key: TriggerKey) -> Option<Instant> {
        self.last_fired
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .copied()
    }
}
