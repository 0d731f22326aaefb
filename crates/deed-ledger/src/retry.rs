use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Jittered exponential backoff for the append loop.
///
/// `max_attempts` counts the first try. Delays double from `base_delay_ms`
/// and are capped at `max_delay_ms`, then spread by up to `jitter_pct` in
/// either direction so racing writers do not retry in lockstep.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_pct: f64,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, base_delay_ms: u64, max_delay_ms: u64, jitter_pct: f64) -> Self {
        let clamped_attempts = max_attempts.max(1);
        let clamped_base = base_delay_ms.max(1);
        let clamped_max_delay = max_delay_ms.max(clamped_base);
        let clamped_jitter = jitter_pct.clamp(0.0, 1.0);
        Self {
            max_attempts: clamped_attempts,
            base_delay_ms: clamped_base,
            max_delay_ms: clamped_max_delay,
            jitter_pct: clamped_jitter,
        }
    }

    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self::new(1, 1, 1, 0.0)
    }

    /// Re-apply the clamps, e.g. after deserializing user configuration.
    pub fn normalized(&self) -> Self {
        Self::new(
            self.max_attempts,
            self.base_delay_ms,
            self.max_delay_ms,
            self.jitter_pct,
        )
    }

    /// Delay before retry number `attempt + 1` (zero-based).
    pub fn next_delay(&self, attempt: usize) -> Duration {
        let exp = 2_u64.saturating_pow(u32::try_from(attempt).unwrap_or(u32::MAX));
        let delay = self.base_delay_ms.saturating_mul(exp).min(self.max_delay_ms);
        let jittered = if self.jitter_pct > 0.0 {
            let spread = (delay as f64 * self.jitter_pct) as i64;
            let delta = rand::thread_rng().gen_range(-spread..=spread);
            delay.saturating_add_signed(delta)
        } else {
            delay
        };
        Duration::from_millis(jittered)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(8, 5, 200, 0.5)
    }
}
