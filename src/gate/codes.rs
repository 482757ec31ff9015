//! Preset demo access codes.
//!
//! The table is compiled in and never changes at runtime. It gates the UI
//! flow only: anyone holding the binary can read every code, so a real
//! deployment must validate codes server-side.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Wildcard permission that satisfies every permission check.
pub const FULL_DEMO: &str = "full_demo";

const MINUTE_MS: i64 = 60 * 1000;

/// Named aliases for the preset codes.
pub mod demo_codes {
    pub const VIP: &str = "HELIOS2024VIP";
    pub const DEVELOPER: &str = "DEV_PREVIEW_2024";
    pub const STANDARD: &str = "DEMO_ACCESS_2024";
    pub const BETA: &str = "BETA_TESTER_2024";
    pub const CONFERENCE: &str = "CONF2024_HELIOS";
}

/// Display identity attached to a code. Not an authenticated identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub tier: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitPolicy {
    pub requests_per_window: u32,
    pub window_duration_ms: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessCodeRecord {
    pub user: UserProfile,
    pub permissions: Vec<String>,
    pub max_usage: u64,
    pub rate_limit: RateLimitPolicy,
    pub description: String,
}

impl AccessCodeRecord {
    fn preset(
        name: &str,
        tier: &str,
        permissions: &[&str],
        max_usage: u64,
        requests_per_minute: u32,
        description: &str,
    ) -> Self {
        Self {
            user: UserProfile {
                name: name.to_string(),
                tier: tier.to_string(),
            },
            permissions: permissions.iter().map(ToString::to_string).collect(),
            max_usage,
            rate_limit: RateLimitPolicy {
                requests_per_window: requests_per_minute,
                window_duration_ms: MINUTE_MS,
            },
            description: description.to_string(),
        }
    }
}

/// Trim and uppercase a submitted code. Every lookup and storage key uses
/// this form.
#[must_use]
pub fn normalize(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Immutable lookup table of access codes, keyed by normalized code.
#[derive(Clone, Debug)]
pub struct AccessCodeTable {
    codes: BTreeMap<String, AccessCodeRecord>,
}

impl AccessCodeTable {
    /// The five preset demo codes.
    #[must_use]
    pub fn presets() -> Self {
        let codes = [
            (
                demo_codes::VIP,
                AccessCodeRecord::preset(
                    "VIP User",
                    "vip",
                    &[FULL_DEMO, "performance_metrics", "universe_management"],
                    1000,
                    100,
                    "Full access with performance metrics",
                ),
            ),
            (
                demo_codes::DEVELOPER,
                AccessCodeRecord::preset(
                    "Developer",
                    "developer",
                    &[FULL_DEMO, "performance_metrics"],
                    500,
                    50,
                    "Developer preview access",
                ),
            ),
            (
                demo_codes::STANDARD,
                AccessCodeRecord::preset(
                    "Demo User",
                    "standard",
                    &["basic_demo"],
                    100,
                    20,
                    "Standard demo access",
                ),
            ),
            (
                demo_codes::BETA,
                AccessCodeRecord::preset(
                    "Beta Tester",
                    "beta",
                    &[FULL_DEMO, "beta_features"],
                    250,
                    30,
                    "Beta testing access with new features",
                ),
            ),
            (
                demo_codes::CONFERENCE,
                AccessCodeRecord::preset(
                    "Conference Attendee",
                    "conference",
                    &["demo_showcase"],
                    50,
                    15,
                    "Conference demonstration access",
                ),
            ),
        ];

        Self::from_records(codes.map(|(code, record)| (code.to_string(), record)))
    }

    /// Build a table from arbitrary records. Keys are normalized on insert.
    pub fn from_records(records: impl IntoIterator<Item = (String, AccessCodeRecord)>) -> Self {
        Self {
            codes: records
                .into_iter()
                .map(|(code, record)| (normalize(&code), record))
                .collect(),
        }
    }

    /// Look up a code. The argument is normalized first.
    #[must_use]
    pub fn get(&self, code: &str) -> Option<&AccessCodeRecord> {
        self.codes.get(&normalize(code))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AccessCodeRecord)> {
        self.codes.iter().map(|(code, record)| (code.as_str(), record))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl Default for AccessCodeTable {
    fn default() -> Self {
        Self::presets()
    }
}
