//! Tick timing for the poll scheduler.
//!
//! The baseline contract is a fixed period with no jitter and no pause on
//! failure. Exponential backoff after consecutive failed ticks is available
//! as an explicit opt-in and leaves the default untouched.

use std::time::Duration;

/// Default period between ticks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(3000);

/// Shortest period a policy accepts; a timer cannot tick on a zero period.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Opt-in backoff after failed ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    /// Upper bound for the gap between two ticks.
    pub max_delay: Duration,
}

/// When the next tick fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    period: Duration,
    backoff: Option<Backoff>,
}

impl PollPolicy {
    /// Fixed-period policy. Periods below [`MIN_POLL_INTERVAL`] are raised to it.
    pub fn fixed(period: Duration) -> Self {
        Self {
            period: period.max(MIN_POLL_INTERVAL),
            backoff: None,
        }
    }

    /// Enable backoff after failed ticks, capped at `max_delay`.
    pub fn with_backoff(mut self, max_delay: Duration) -> Self {
        self.backoff = Some(Backoff {
            max_delay: max_delay.max(self.period),
        });
        self
    }

    /// The fixed period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Whether backoff is enabled.
    pub fn backoff(&self) -> Option<Backoff> {
        self.backoff
    }

    /// Gap before the next tick after `consecutive_failures` failed ticks.
    ///
    /// Always the period without backoff. With backoff the period doubles per
    /// failure, capped at `max_delay`.
    pub fn delay_after(&self, consecutive_failures: u32) -> Duration {
        match self.backoff {
            None => self.period,
            Some(Backoff { max_delay }) => {
                let factor = 2u32.saturating_pow(consecutive_failures.min(16));
                self.period.saturating_mul(factor).min(max_delay)
            }
        }
    }

    /// Extra wait on top of the regular period after `consecutive_failures`.
    pub fn extra_delay(&self, consecutive_failures: u32) -> Duration {
        self.delay_after(consecutive_failures).saturating_sub(self.period)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::fixed(DEFAULT_POLL_INTERVAL)
    }
}
