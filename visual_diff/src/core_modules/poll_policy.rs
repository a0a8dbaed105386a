// THEORY:
// Waiting for two images is a bounded, fixed-interval poll. This module turns that loop
// into data (`PollPolicy`) plus a tick source (`PollClock`), so the orchestrator never
// sleeps on its own. Production code ticks on a tokio interval; tests hand in a clock
// that simply counts ticks, which makes "timed out after exactly N attempts" something
// you can assert on without waiting on the wall clock.

pub mod poll_policy {
    use crate::error::{DiffError, Result};
    use futures::future::BoxFuture;
    use std::time::Duration;
    use tokio::time::{Instant, Interval, MissedTickBehavior};

    pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

    /// Fixed-interval retry budget for image acquisition.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PollPolicy {
        pub interval: Duration,
        pub max_attempts: u32,
    }

    impl Default for PollPolicy {
        fn default() -> Self {
            Self {
                interval: DEFAULT_POLL_INTERVAL,
                max_attempts: DEFAULT_MAX_ATTEMPTS,
            }
        }
    }

    impl PollPolicy {
        pub fn new(interval: Duration, max_attempts: u32) -> Result<Self> {
            let policy = Self {
                interval,
                max_attempts,
            };
            policy.validate()?;
            Ok(policy)
        }

        pub fn from_millis(interval_ms: u64, max_attempts: u32) -> Result<Self> {
            Self::new(Duration::from_millis(interval_ms), max_attempts)
        }

        pub fn validate(&self) -> Result<()> {
            if self.max_attempts == 0 {
                return Err(DiffError::invalid("max attempts should be a positive integer"));
            }
            if self.interval.is_zero() {
                return Err(DiffError::invalid("poll interval should be a positive duration"));
            }
            Ok(())
        }

        /// Upper bound on time spent waiting before a timeout is reported.
        pub fn budget(&self) -> Duration {
            self.interval.saturating_mul(self.max_attempts)
        }

        /// The production clock for this policy.
        pub fn clock(&self) -> Result<IntervalClock> {
            self.validate()?;
            IntervalClock::new(self.interval)
        }
    }

    /// Source of poll ticks. Each call resolves when the next check should run.
    pub trait PollClock: Send {
        fn tick(&mut self) -> BoxFuture<'_, ()>;
    }

    /// Ticks on a tokio interval. The first tick fires one full period after creation.
    pub struct IntervalClock {
        interval: Interval,
    }

    impl IntervalClock {
        pub fn new(period: Duration) -> Result<Self> {
            if period.is_zero() {
                return Err(DiffError::invalid("poll interval should be a positive duration"));
            }
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            Ok(Self { interval })
        }
    }

    impl PollClock for IntervalClock {
        fn tick(&mut self) -> BoxFuture<'_, ()> {
            Box::pin(async move {
                self.interval.tick().await;
            })
        }
    }
}
