// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded exponential backoff with jitter for reconnect attempts.

use std::time::Duration;

use rand::Rng;

use waworker_config::model::ReconnectConfig;

/// Reconnect delay policy: `initial * 2^attempt`, capped, with a
/// jitter fraction so a fleet of channels does not thunder back in
/// lockstep after a shared outage.
pub struct Backoff {
    initial: Duration,
    max: Duration,
    jitter: f64,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration, jitter: f64) -> Self {
        Self {
            initial,
            max,
            jitter: jitter.clamp(0.0, 1.0),
        }
    }

    pub fn from_config(config: &ReconnectConfig) -> Self {
        Self::new(
            Duration::from_millis(config.initial_delay_ms),
            Duration::from_millis(config.max_delay_ms),
            config.jitter,
        )
    }

    /// Delay before retry number `attempt` (0-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let shift = attempt.min(16);
        let base = self.initial.saturating_mul(1u32 << shift).min(self.max);
        if self.jitter == 0.0 {
            return base;
        }
        let factor = 1.0 + rand::thread_rng().gen_range(-self.jitter..=self.jitter);
        base.mul_f64(factor.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_jitter_doubles_until_cap() {
        let backoff = Backoff::new(Duration::from_millis(100), Duration::from_secs(1), 0.0);
        assert_eq!(backoff.delay(0), Duration::from_millis(100));
        assert_eq!(backoff.delay(1), Duration::from_millis(200));
        assert_eq!(backoff.delay(2), Duration::from_millis(400));
        assert_eq!(backoff.delay(3), Duration::from_millis(800));
        assert_eq!(backoff.delay(4), Duration::from_secs(1));
        assert_eq!(backoff.delay(30), Duration::from_secs(1));
    }

    #[test]
    fn jitter_stays_within_fraction() {
        let backoff = Backoff::new(Duration::from_millis(1000), Duration::from_secs(60), 0.2);
        for _ in 0..100 {
            let d = backoff.delay(0);
            assert!(d >= Duration::from_millis(800), "{d:?}");
            assert!(d <= Duration::from_millis(1200), "{d:?}");
        }
    }

    #[test]
    fn from_config_uses_millis() {
        let config = ReconnectConfig {
            initial_delay_ms: 50,
            max_delay_ms: 100,
            jitter: 0.0,
        };
        let backoff = Backoff::from_config(&config);
        assert_eq!(backoff.delay(0), Duration::from_millis(50));
        assert_eq!(backoff.delay(5), Duration::from_millis(100));
    }
}
