use rand::Rng;
use std::time::Duration;

use crate::infrastructure::config::ClientConfig;

/// Largest share of a delay added as random jitter
const MAX_JITTER_RATIO: f64 = 0.25;

/// Exponential reconnection delays with jitter and a cap on consecutive failures
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconnectPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl From<&ClientConfig> for ReconnectPolicy {
    fn from(config: &ClientConfig) -> Self {
        Self {
            base_delay: config.reconnect_base_delay,
            max_delay: config.reconnect_max_delay,
            max_attempts: config.reconnect_max_attempts,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before retry number `attempt` (0-based), without jitter
    pub fn base_delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(31));
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Delay before retry number `attempt`, with up to 25% jitter added
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.base_delay_for(attempt);
        let jitter = rand::thread_rng().gen_range(0.0..=MAX_JITTER_RATIO);
        base + base.mul_f64(jitter)
    }

    /// Whether another attempt may follow `failures` consecutive failures
    pub fn allows(&self, failures: u32) -> bool {
        failures < self.max_attempts
    }
}
