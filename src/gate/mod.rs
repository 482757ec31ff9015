//! Demo access gate: code validation, usage/rate limiting and sessions.
//!
//! ## Not a security boundary
//!
//! Codes are compiled into the binary and all counters live in process
//! memory or a local file the user controls. The gate paces and shapes the
//! demo flow; any deployment that needs real access control must validate
//! codes server-side.
//!
//! ## Flow
//!
//! 1) [`Gate::validate`] maps a code to its [`AccessCodeRecord`] and rejects
//!    codes whose per-code session marker expired.
//! 2) [`Gate::check_and_consume`] enforces the lifetime usage ceiling and the
//!    per-minute window, then counts the request.
//! 3) [`Gate::authenticate`] composes both into a [`Session`] stored under
//!    [`SESSION_KEY`] for 24 hours.
//! 4) [`spawn_cleanup`] sweeps stale windows and expired markers every
//!    15 minutes.

pub mod cleanup;
pub mod clock;
pub mod codes;
pub mod config;
pub mod delay;
pub mod error;
pub mod limiter;
pub mod permissions;
pub mod session;
pub mod storage;
pub mod store;
pub mod validator;

pub use self::cleanup::{spawn_cleanup, CleanupReport};
pub use self::clock::{Clock, ManualClock, SystemClock};
pub use self::codes::{
    demo_codes, normalize, AccessCodeRecord, AccessCodeTable, RateLimitPolicy, UserProfile,
};
pub use self::config::GateConfig;
pub use self::delay::{Delay, JitterDelay, NoDelay};
pub use self::error::GateError;
pub use self::limiter::{RateLimitResult, RateLimitState, UsageLimiter, UsageStats};
pub use self::permissions::has_permission;
pub use self::session::{AuthOutcome, Session};
pub use self::storage::{FileStorage, LocalStorage, MemoryStorage, SESSION_KEY};
pub use self::store::{MemoryStore, StateStore};
pub use self::validator::{AccessValidator, ValidationResult};

use std::sync::Arc;

/// Validator, limiter and session flow sharing one code table, clock and
/// storage.
#[derive(Debug)]
pub struct Gate {
    config: GateConfig,
    codes: Arc<AccessCodeTable>,
    storage: Arc<dyn LocalStorage>,
    clock: Arc<dyn Clock>,
    validator: AccessValidator,
    limiter: UsageLimiter,
}

impl Gate {
    /// Start building a gate over `storage`. Defaults: preset codes, system
    /// clock, jittered validation delay, fresh in-memory limiter state.
    pub fn builder(storage: Arc<dyn LocalStorage>) -> GateBuilder {
        GateBuilder {
            storage,
            config: GateConfig::new(),
            codes: None,
            clock: None,
            delay: None,
            windows: None,
            usage: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    #[must_use]
    pub fn codes(&self) -> &AccessCodeTable {
        &self.codes
    }

    #[must_use]
    pub fn storage(&self) -> &dyn LocalStorage {
        self.storage.as_ref()
    }

    #[must_use]
    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    #[must_use]
    pub fn limiter(&self) -> &UsageLimiter {
        &self.limiter
    }

    pub async fn validate(&self, code: &str) -> ValidationResult {
        self.validator.validate(code).await
    }

    pub fn check_and_consume(&self, code: &str) -> RateLimitResult {
        self.limiter.check_and_consume(code)
    }

    pub fn increment_usage(&self, code: &str, increment: u64) {
        self.limiter.increment_usage(code, increment);
    }

    pub fn usage_stats(&self, code: &str) -> UsageStats {
        self.limiter.usage_stats(code)
    }
}

pub struct GateBuilder {
    storage: Arc<dyn LocalStorage>,
    config: GateConfig,
    codes: Option<Arc<AccessCodeTable>>,
    clock: Option<Arc<dyn Clock>>,
    delay: Option<Arc<dyn Delay>>,
    windows: Option<Arc<dyn StateStore<RateLimitState>>>,
    usage: Option<Arc<dyn StateStore<u64>>>,
}

impl GateBuilder {
    #[must_use]
    pub fn config(mut self, config: GateConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn codes(mut self, codes: AccessCodeTable) -> Self {
        self.codes = Some(Arc::new(codes));
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    #[must_use]
    pub fn delay(mut self, delay: Arc<dyn Delay>) -> Self {
        self.delay = Some(delay);
        self
    }

    #[must_use]
    pub fn windows(mut self, windows: Arc<dyn StateStore<RateLimitState>>) -> Self {
        self.windows = Some(windows);
        self
    }

    #[must_use]
    pub fn usage(mut self, usage: Arc<dyn StateStore<u64>>) -> Self {
        self.usage = Some(usage);
        self
    }

    #[must_use]
    pub fn build(self) -> Gate {
        let codes = self
            .codes
            .unwrap_or_else(|| Arc::new(AccessCodeTable::presets()));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let config = self.config;
        let delay = self
            .delay
            .unwrap_or_else(|| Arc::new(JitterDelay::new(config.validation_delay_ms())));
        let windows = self
            .windows
            .unwrap_or_else(|| Arc::new(MemoryStore::new("rate limit")));
        let usage = self
            .usage
            .unwrap_or_else(|| Arc::new(MemoryStore::new("usage")));

        let validator =
            AccessValidator::new(codes.clone(), self.storage.clone(), clock.clone(), delay);
        let limiter = UsageLimiter::new(codes.clone(), clock.clone(), windows, usage);

        Gate {
            config,
            codes,
            storage: self.storage,
            clock,
            validator,
            limiter,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{gate, NOW};
    use super::*;

    #[tokio::test]
    async fn validate_then_consume() {
        let (gate, _, _) = gate();
        assert!(gate.validate(demo_codes::BETA).await.valid);
        let result = gate.check_and_consume(demo_codes::BETA);
        assert!(result.allowed);
        assert_eq!(result.rate_limit_remaining, Some(29));
        assert_eq!(gate.usage_stats(demo_codes::BETA).usage_count, 1);
        assert_eq!(gate.now_ms(), NOW);
    }

    #[test]
    fn gates_do_not_share_limiter_state() {
        let (first, _, _) = gate();
        let (second, _, _) = gate();
        first.check_and_consume(demo_codes::VIP);
        assert_eq!(first.usage_stats(demo_codes::VIP).usage_count, 1);
        assert_eq!(second.usage_stats(demo_codes::VIP).usage_count, 0);
    }

    #[test]
    fn builder_accepts_custom_codes() {
        let record = AccessCodeRecord {
            user: UserProfile {
                name: "Tester".to_string(),
                tier: "test".to_string(),
            },
            permissions: vec!["basic_demo".to_string()],
            max_usage: 1,
            rate_limit: RateLimitPolicy {
                requests_per_window: 1,
                window_duration_ms: 1_000,
            },
            description: "single use".to_string(),
        };
        let gate = Gate::builder(Arc::new(MemoryStorage::new()))
            .codes(AccessCodeTable::from_records([("once".to_string(), record)]))
            .clock(Arc::new(ManualClock::new(NOW)))
            .build();

        assert_eq!(gate.codes().len(), 1);
        assert!(gate.check_and_consume("ONCE").allowed);
        assert!(!gate.check_and_consume("ONCE").allowed);
        assert!(!gate.check_and_consume(demo_codes::VIP).allowed);
    }
}
