use crate::cli::globals::GlobalArgs;
use crate::dashboard::{extract_kpis, format_api_error, BackendClient, KpiSource, LiveStats};
use crate::gate::{has_permission, Session, SystemClock};
use anyhow::{anyhow, Context, Result};
use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::warn;

const PERFORMANCE_METRICS: &str = "performance_metrics";

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub backend_url: String,
    pub interval: Duration,
    pub once: bool,
}

/// KPI line for a snapshot, plus raw benchmarks for sessions holding the
/// `performance_metrics` permission.
#[must_use]
pub fn render(session: &Session, stats: &LiveStats, now_ms: i64) -> String {
    let kpis = extract_kpis(Some(stats), now_ms);
    let mut out = kpis.to_string();
    if kpis.source == KpiSource::Fallback {
        out.push_str(" (offline)");
    }

    if has_permission(&session.permissions, PERFORMANCE_METRICS) {
        if let Some(benchmarks) = &stats.benchmarks {
            let _ = write!(out, "\nBenchmarks: {benchmarks}");
        }
    }
    out
}

/// Poll the backend for the active session until it expires or the user
/// interrupts.
///
/// # Errors
/// Returns an error if no session is active or the backend URL is invalid.
pub async fn execute(args: Args) -> Result<()> {
    let gate = args.globals.gate();
    let session = gate
        .restore()
        .ok_or_else(|| anyhow!("No active demo session. Run `helios-gate login <code>` first."))?;

    let client = BackendClient::new(&args.backend_url, Arc::new(SystemClock))
        .context("invalid --backend-url")?;

    let health = client.health().await;
    if !health.success {
        let message = format_api_error(health.error.as_deref().unwrap_or_default());
        warn!("backend health check failed: {message}");
        println!("{message}");
    }

    let demo = client.initialize_demo_session(&session.access_code).await;
    println!("Demo session {}", demo.session_id);
    println!("{}", render(&session, &demo.stats, gate.now_ms()));

    if args.once {
        return Ok(());
    }

    let mut ticker = interval_at(Instant::now() + args.interval, args.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => break,
        }

        if !session.is_active(gate.now_ms()) {
            println!("Demo session expired");
            break;
        }

        let stats = client.live_stats().await;
        println!("{}", render(&session, &stats, gate.now_ms()));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::gate::UserProfile;
    use serde_json::json;

    fn session(permissions: &[&str]) -> Session {
        Session {
            access_code: "HELIOS2024VIP".to_string(),
            user: UserProfile {
                name: "VIP User".to_string(),
                tier: "vip".to_string(),
            },
            permissions: permissions.iter().map(ToString::to_string).collect(),
            usage_count: 1,
            max_usage: 1000,
            expires_at: 10,
            created_at: 0,
        }
    }

    fn stats() -> LiveStats {
        LiveStats {
            metrics: Some(json!({"vstCommitLatency": "61μs", "activeUniverses": 7})),
            benchmarks: Some(json!({"performanceGain": "640x"})),
            health: None,
            last_updated: 5,
        }
    }

    #[test]
    fn benchmarks_need_performance_metrics() {
        let shown = render(&session(&["performance_metrics"]), &stats(), 5);
        assert!(shown.contains("VST commit latency 61μs"));
        assert!(shown.contains("performance gain 640x"));
        assert!(shown.contains("Benchmarks:"));

        let hidden = render(&session(&["basic_demo"]), &stats(), 5);
        assert!(!hidden.contains("Benchmarks:"));
    }

    #[test]
    fn full_demo_sees_benchmarks() {
        assert!(render(&session(&["full_demo"]), &stats(), 5).contains("Benchmarks:"));
    }

    #[test]
    fn empty_snapshot_is_marked_offline() {
        let empty = LiveStats {
            metrics: None,
            benchmarks: None,
            health: None,
            last_updated: 5,
        };
        let shown = render(&session(&["full_demo"]), &empty, 5);
        assert!(shown.contains("active universes 42"));
        assert!(shown.ends_with("(offline)"));
    }

    #[tokio::test]
    async fn requires_an_active_session() {
        let dir = tempfile::tempdir().unwrap();
        let args = Args {
            globals: GlobalArgs::new(dir.path().join("storage.json")),
            backend_url: "http://127.0.0.1:9".to_string(),
            interval: Duration::from_secs(30),
            once: true,
        };
        let err = execute(args).await.err().map(|e| e.to_string());
        assert_eq!(
            err.as_deref(),
            Some("No active demo session. Run `helios-gate login <code>` first.")
        );
    }
}
