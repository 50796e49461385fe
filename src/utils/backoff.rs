use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::utils::time::sleep_ns;

/// Bounded retry: `attempts` tries spaced by a fixed `delay_ms`.
///
/// Used for connect (3 x 100 ms), frame send (3 x 25 ms) and frame receive (40 x 25 ms).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct RetryCfg {
    pub attempts: u32,
    pub delay_ms: u64,
}

impl RetryCfg {
    pub const fn new(attempts: u32, delay_ms: u64) -> Self {
        Self { attempts, delay_ms }
    }

    #[inline]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Sleeps for one retry interval.
    #[inline]
    pub fn pause(&self) {
        if self.delay_ms > 0 {
            sleep_ns(self.delay_ms * 1_000_000);
        }
    }

    /// Runs `op` until it yields `Some`, pausing between tries.
    ///
    /// No pause follows the final failed attempt.
    pub fn run<T>(&self, mut op: impl FnMut(u32) -> Option<T>) -> Option<T> {
        for attempt in 0..self.attempts {
            if let Some(v) = op(attempt) {
                return Some(v);
            }
            if attempt + 1 < self.attempts {
                self.pause();
            }
        }
        None
    }
}
