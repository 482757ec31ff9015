//! Per-code usage ceiling and fixed-window rate limiting.
//!
//! Flow for each consumed request:
//! 1) Reject unknown codes (fail closed, independently of validation).
//! 2) Reject codes whose lifetime usage reached `max_usage`, without mutation.
//! 3) Roll the code's window forward from "now" if its reset time passed.
//! 4) Reject when the window is full, reporting whole minutes until reset.
//! 5) Otherwise count the request in both the window and the usage counter.
//!
//! Steps 2-5 run under one lock so concurrent callers never overshoot.

use super::{
    clock::Clock,
    codes::{normalize, AccessCodeRecord, AccessCodeTable},
    error::GateError,
    store::StateStore,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, warn};

const MINUTE_MS: i64 = 60 * 1000;

pub const MSG_UNKNOWN_CODE: &str = "Invalid access code";
pub const MSG_USAGE_EXCEEDED: &str = "Usage limit exceeded for this access code";
pub const MSG_LIMITER_ERROR: &str = "Rate limiting service error";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitState {
    pub requests_in_window: u32,
    pub window_reset_at: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitResult {
    pub allowed: bool,
    pub usage_count: u64,
    pub max_usage: u64,
    /// Whole minutes until the window resets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit_remaining: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RateLimitResult {
    fn rejected(usage_count: u64, max_usage: u64, message: impl Into<String>) -> Self {
        Self {
            allowed: false,
            usage_count,
            max_usage,
            reset_time: None,
            rate_limit_remaining: None,
            message: Some(message.into()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    pub usage_count: u64,
    pub max_usage: u64,
    pub percentage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
}

impl UsageStats {
    fn empty() -> Self {
        Self {
            usage_count: 0,
            max_usage: 0,
            percentage: 0.0,
            tier: None,
            permissions: None,
        }
    }
}

/// Usage percentage rounded to one decimal and clamped to `[0, 100]`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn usage_percentage(usage_count: u64, max_usage: u64) -> f64 {
    if max_usage == 0 {
        return 0.0;
    }
    let percentage = (usage_count as f64 / max_usage as f64 * 100.0).clamp(0.0, 100.0);
    (percentage * 10.0).round() / 10.0
}

#[derive(Debug)]
pub struct UsageLimiter {
    codes: Arc<AccessCodeTable>,
    clock: Arc<dyn Clock>,
    windows: Arc<dyn StateStore<RateLimitState>>,
    usage: Arc<dyn StateStore<u64>>,
    // Held across each check-then-increment sequence.
    guard: Mutex<()>,
}

impl UsageLimiter {
    pub fn new(
        codes: Arc<AccessCodeTable>,
        clock: Arc<dyn Clock>,
        windows: Arc<dyn StateStore<RateLimitState>>,
        usage: Arc<dyn StateStore<u64>>,
    ) -> Self {
        Self {
            codes,
            clock,
            windows,
            usage,
            guard: Mutex::new(()),
        }
    }

    /// Check the usage ceiling and rate window for a code and, if both allow
    /// it, count one request.
    pub fn check_and_consume(&self, code: &str) -> RateLimitResult {
        let normalized = normalize(code);
        let Some(record) = self.codes.get(&normalized) else {
            warn!("rate check for unknown access code");
            return RateLimitResult::rejected(0, 0, MSG_UNKNOWN_CODE);
        };

        match self.consume(&normalized, record) {
            Ok(result) => result,
            Err(e) => {
                error!("Rate limit check error: {e}");
                RateLimitResult::rejected(0, 0, MSG_LIMITER_ERROR)
            }
        }
    }

    fn consume(
        &self,
        code: &str,
        record: &AccessCodeRecord,
    ) -> Result<RateLimitResult, GateError> {
        let _guard = self
            .guard
            .lock()
            .map_err(|_| GateError::Poisoned("limiter"))?;

        let now = self.clock.now_ms();
        let max_usage = record.max_usage;
        let policy = record.rate_limit;

        let usage = self.usage.get(code)?.unwrap_or(0);
        if usage >= max_usage {
            warn!("access code {code} exhausted its usage ({usage}/{max_usage})");
            return Ok(RateLimitResult::rejected(usage, max_usage, MSG_USAGE_EXCEEDED));
        }

        let mut window = self.windows.get(code)?.unwrap_or(RateLimitState {
            requests_in_window: 0,
            window_reset_at: now + policy.window_duration_ms,
        });

        if now >= window.window_reset_at {
            // Rolls from now, not from the missed boundary.
            window.requests_in_window = 0;
            window.window_reset_at = now + policy.window_duration_ms;
        }

        if window.requests_in_window >= policy.requests_per_window {
            let reset_in_minutes = ceil_div(window.window_reset_at - now, MINUTE_MS);
            warn!("access code {code} rate limited for {reset_in_minutes} minutes");
            self.windows.set(code, window)?;
            return Ok(RateLimitResult {
                reset_time: Some(reset_in_minutes),
                ..RateLimitResult::rejected(
                    usage,
                    max_usage,
                    format!("Rate limit exceeded. Try again in {reset_in_minutes} minutes."),
                )
            });
        }

        window.requests_in_window += 1;
        let usage = usage + 1;

        self.windows.set(code, window)?;
        self.usage.set(code, usage)?;

        let remaining = policy.requests_per_window - window.requests_in_window;
        debug!("access code {code} consumed {usage}/{max_usage}, {remaining} left in window");

        Ok(RateLimitResult {
            allowed: true,
            usage_count: usage,
            max_usage,
            reset_time: None,
            rate_limit_remaining: Some(remaining),
            message: None,
        })
    }

    /// Add `increment` to a known code's usage, saturating at its ceiling.
    pub fn increment_usage(&self, code: &str, increment: u64) {
        let normalized = normalize(code);
        let Some(record) = self.codes.get(&normalized) else {
            debug!("ignoring usage increment for unknown access code");
            return;
        };

        let result = self
            .guard
            .lock()
            .map_err(|_| GateError::Poisoned("limiter"))
            .and_then(|_guard| {
                let usage = self.usage.get(&normalized)?.unwrap_or(0);
                let usage = usage.saturating_add(increment).min(record.max_usage);
                self.usage.set(&normalized, usage)
            });

        if let Err(e) = result {
            error!("Usage increment error: {e}");
        }
    }

    /// Read-only usage snapshot for a code.
    pub fn usage_stats(&self, code: &str) -> UsageStats {
        let normalized = normalize(code);
        let Some(record) = self.codes.get(&normalized) else {
            return UsageStats::empty();
        };

        match self.usage.get(&normalized) {
            Ok(usage) => {
                let usage_count = usage.unwrap_or(0);
                UsageStats {
                    usage_count,
                    max_usage: record.max_usage,
                    percentage: usage_percentage(usage_count, record.max_usage),
                    tier: Some(record.user.tier.clone()),
                    permissions: Some(record.permissions.clone()),
                }
            }
            Err(e) => {
                error!("Usage stats error: {e}");
                UsageStats::empty()
            }
        }
    }

    /// Current window for a code, if one was ever opened.
    ///
    /// # Errors
    /// Returns an error if the window store cannot be read.
    pub fn window(&self, code: &str) -> Result<Option<RateLimitState>, GateError> {
        self.windows.get(&normalize(code))
    }

    /// Drop windows whose reset time is at least `grace_ms` in the past.
    /// Returns how many were removed.
    ///
    /// # Errors
    /// Returns an error if the window store cannot be read or written.
    pub fn sweep_windows(&self, grace_ms: i64) -> Result<usize, GateError> {
        let _guard = self
            .guard
            .lock()
            .map_err(|_| GateError::Poisoned("limiter"))?;

        let now = self.clock.now_ms();
        let mut removed = 0;
        for (code, window) in self.windows.entries()? {
            if now >= window.window_reset_at + grace_ms {
                self.windows.delete(&code)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn ceil_div(value: i64, divisor: i64) -> i64 {
    (value + divisor - 1).div_euclid(divisor)
}
