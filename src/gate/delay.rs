//! Cosmetic pacing applied before a code is validated.

use rand::{rngs::StdRng, Rng, SeedableRng};
use std::fmt;
use std::future::Future;
use std::ops::Range;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::sleep;

pub type DelayFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

pub trait Delay: Send + Sync + fmt::Debug {
    fn wait(&self) -> DelayFuture<'_>;
}

/// Resolves immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl Delay for NoDelay {
    fn wait(&self) -> DelayFuture<'_> {
        Box::pin(async {})
    }
}

/// Sleeps for a uniformly random duration within `range_ms`.
#[derive(Debug)]
pub struct JitterDelay {
    range_ms: Range<u64>,
    rng: Mutex<StdRng>,
}

impl JitterDelay {
    #[must_use]
    pub fn new(range_ms: Range<u64>) -> Self {
        Self {
            range_ms,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    fn next_delay(&self) -> Duration {
        if self.range_ms.is_empty() {
            return Duration::from_millis(self.range_ms.start);
        }
        // A poisoned rng still yields usable numbers.
        let mut rng = match self.rng.lock() {
            Ok(rng) => rng,
            Err(poisoned) => poisoned.into_inner(),
        };
        Duration::from_millis(rng.gen_range(self.range_ms.clone()))
    }
}

impl Delay for JitterDelay {
    fn wait(&self) -> DelayFuture<'_> {
        let delay = self.next_delay();
        Box::pin(sleep(delay))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jitter_stays_in_range() {
        let delay = JitterDelay::new(500..1500);
        for _ in 0..100 {
            let d = delay.next_delay();
            assert!(d >= Duration::from_millis(500));
            assert!(d < Duration::from_millis(1500));
        }
    }

    #[test]
    fn empty_range_uses_start() {
        let delay = JitterDelay::new(0..0);
        assert_eq!(delay.next_delay(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn jitter_sleeps_on_the_tokio_clock() {
        let started = tokio::time::Instant::now();
        JitterDelay::new(500..1500).wait().await;
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(500));
    }

    #[tokio::test]
    async fn no_delay_resolves() {
        NoDelay.wait().await;
    }
}
