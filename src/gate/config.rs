use std::ops::Range;
use std::time::Duration;

const DEFAULT_SESSION_TTL_MS: i64 = 24 * 60 * 60 * 1000;
const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(15 * 60);
const DEFAULT_RATE_STATE_GRACE_MS: i64 = 60 * 60 * 1000;
const DEFAULT_VALIDATION_DELAY_MS: Range<u64> = 500..1500;

#[derive(Clone, Debug)]
pub struct GateConfig {
    session_ttl_ms: i64,
    cleanup_interval: Duration,
    rate_state_grace_ms: i64,
    validation_delay_ms: Range<u64>,
}

impl GateConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            session_ttl_ms: DEFAULT_SESSION_TTL_MS,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
            rate_state_grace_ms: DEFAULT_RATE_STATE_GRACE_MS,
            validation_delay_ms: DEFAULT_VALIDATION_DELAY_MS,
        }
    }

    #[must_use]
    pub fn with_session_ttl_ms(mut self, ms: i64) -> Self {
        self.session_ttl_ms = ms;
        self
    }

    #[must_use]
    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    #[must_use]
    pub fn with_rate_state_grace_ms(mut self, ms: i64) -> Self {
        self.rate_state_grace_ms = ms;
        self
    }

    #[must_use]
    pub fn with_validation_delay_ms(mut self, range: Range<u64>) -> Self {
        self.validation_delay_ms = range;
        self
    }

    #[must_use]
    pub fn session_ttl_ms(&self) -> i64 {
        self.session_ttl_ms
    }

    #[must_use]
    pub fn cleanup_interval(&self) -> Duration {
        self.cleanup_interval
    }

    #[must_use]
    pub fn rate_state_grace_ms(&self) -> i64 {
        self.rate_state_grace_ms
    }

    #[must_use]
    pub fn validation_delay_ms(&self) -> Range<u64> {
        self.validation_delay_ms.clone()
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self::new()
    }
}
