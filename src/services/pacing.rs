use std::{sync::Mutex, time::Duration};

use async_trait::async_trait;

use crate::configuration::{PacingSettings, PacingStrategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    Matched,
    Missed,
    Failed,
    RateLimited,
}

/// Gate between consecutive lookups.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, outcome: LookupOutcome);
}

pub const DEFAULT_DELAY: Duration = Duration::from_millis(50);

pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        FixedDelay { delay }
    }
}

impl Default for FixedDelay {
    fn default() -> Self {
        FixedDelay::new(DEFAULT_DELAY)
    }
}

#[async_trait]
impl Pacer for FixedDelay {
    async fn pause(&self, _outcome: LookupOutcome) {
        tokio::time::sleep(self.delay).await;
    }
}

pub struct AdaptiveBackoff {
    base: Duration,
    max: Duration,
    current: Mutex<Duration>,
}

impl AdaptiveBackoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        AdaptiveBackoff {
            base,
            max: max.max(base),
            current: Mutex::new(base),
        }
    }

    fn next_delay(&self, outcome: LookupOutcome) -> Duration {
        let mut current = match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        *current = match outcome {
            LookupOutcome::RateLimited => (*current * 2).min(self.max),
            _ => self.base,
        };

        *current
    }
}

#[async_trait]
impl Pacer for AdaptiveBackoff {
    async fn pause(&self, outcome: LookupOutcome) {
        let delay = self.next_delay(outcome);
        if outcome == LookupOutcome::RateLimited {
            log::warn!("Rate limited by provider, pausing {:?}", delay);
        }
        tokio::time::sleep(delay).await;
    }
}

pub fn pacer_from_settings(settings: &PacingSettings) -> Box<dyn Pacer> {
    let base = Duration::from_millis(settings.delay_milliseconds);
    match settings.strategy {
        PacingStrategy::Fixed => Box::new(FixedDelay::new(base)),
        PacingStrategy::Adaptive => Box::new(AdaptiveBackoff::new(
            base,
            Duration::from_millis(settings.max_delay_milliseconds),
        )),
    }
}
