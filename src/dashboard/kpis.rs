use super::client::LiveStats;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

const FALLBACK_VST_LATENCY: &str = "<70μs";
const FALLBACK_MEMORY_EFFICIENCY: &str = "1000x";
const FALLBACK_PERFORMANCE_GAIN: &str = "500x";
const FALLBACK_ACTIVE_UNIVERSES: &str = "42";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KpiSource {
    Live,
    Fallback,
}

/// Headline figures shown on the dashboard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    pub vst_latency: String,
    pub memory_efficiency: String,
    pub performance_gain: String,
    pub active_universes: String,
    pub timestamp: i64,
    pub source: KpiSource,
}

impl fmt::Display for Kpis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "VST commit latency {} | memory efficiency {} | performance gain {} | active universes {}",
            self.vst_latency, self.memory_efficiency, self.performance_gain, self.active_universes
        )
    }
}

/// Render a backend field for display, skipping empty strings, zeros, nulls
/// and `false`.
fn display_value(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64().is_some_and(|f| f != 0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        Value::Array(_) | Value::Object(_) => value.map(ToString::to_string),
        _ => None,
    }
}

fn field(source: Option<&Value>, key: &str, fallback: &str) -> String {
    display_value(source.and_then(|v| v.get(key))).unwrap_or_else(|| fallback.to_string())
}

/// Pick the dashboard KPIs out of a stats snapshot. Without metrics every
/// figure falls back to its published value, stamped with `now_ms`.
#[must_use]
pub fn extract_kpis(stats: Option<&LiveStats>, now_ms: i64) -> Kpis {
    let Some((stats, metrics)) = stats.and_then(|s| s.metrics.as_ref().map(|m| (s, m))) else {
        return Kpis {
            vst_latency: FALLBACK_VST_LATENCY.to_string(),
            memory_efficiency: FALLBACK_MEMORY_EFFICIENCY.to_string(),
            performance_gain: FALLBACK_PERFORMANCE_GAIN.to_string(),
            active_universes: FALLBACK_ACTIVE_UNIVERSES.to_string(),
            timestamp: now_ms,
            source: KpiSource::Fallback,
        };
    };

    Kpis {
        vst_latency: field(Some(metrics), "vstCommitLatency", FALLBACK_VST_LATENCY),
        memory_efficiency: field(Some(metrics), "memoryEfficiency", FALLBACK_MEMORY_EFFICIENCY),
        performance_gain: field(
            stats.benchmarks.as_ref(),
            "performanceGain",
            FALLBACK_PERFORMANCE_GAIN,
        ),
        active_universes: field(Some(metrics), "activeUniverses", FALLBACK_ACTIVE_UNIVERSES),
        timestamp: stats.last_updated,
        source: KpiSource::Live,
    }
}

/// User-facing text for a backend error message.
#[must_use]
pub fn format_api_error(message: &str) -> String {
    if message.is_empty() {
        return "An unexpected error occurred. Please try again.".to_string();
    }
    if message.contains("not found") {
        return "Demo service temporarily unavailable. Please try again.".to_string();
    }
    if message.contains("rate limit") {
        return "Too many requests. Please wait a moment and try again.".to_string();
    }
    if message.contains("timeout") {
        return "Request timed out. Please check your connection and try again.".to_string();
    }
    message.to_string()
}
