use super::{
    error::GateError,
    storage::{stored_expiry, LocalStorage, CODE_SESSION_PREFIX},
    Gate,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupReport {
    pub windows_removed: usize,
    pub sessions_removed: usize,
}

/// Remove `session_*` markers that expired or cannot be parsed.
fn sweep_code_sessions(storage: &dyn LocalStorage, now_ms: i64) -> Result<usize, GateError> {
    let mut removed = 0;
    for key in storage.keys()? {
        if !key.starts_with(CODE_SESSION_PREFIX) {
            continue;
        }
        let Some(raw) = storage.get_item(&key)? else {
            continue;
        };
        let stale = match stored_expiry(&raw) {
            Ok(Some(expires_at)) => expires_at < now_ms,
            Ok(None) => false,
            Err(e) => {
                debug!("unreadable session marker {key}: {e}");
                true
            }
        };
        if stale {
            storage.remove_item(&key)?;
            removed += 1;
        }
    }
    Ok(removed)
}

impl Gate {
    /// Drop rate windows an hour past their reset and expired or unreadable
    /// per-code session markers. Faults are logged, never returned.
    pub fn cleanup_expired_data(&self) -> CleanupReport {
        let mut report = CleanupReport::default();

        match self
            .limiter()
            .sweep_windows(self.config().rate_state_grace_ms())
        {
            Ok(removed) => report.windows_removed = removed,
            Err(e) => error!("Cleanup error: {e}"),
        }

        match sweep_code_sessions(self.storage(), self.now_ms()) {
            Ok(removed) => report.sessions_removed = removed,
            Err(e) => error!("Cleanup error: {e}"),
        }

        debug!(
            "cleanup removed {} windows, {} sessions",
            report.windows_removed, report.sessions_removed
        );
        report
    }
}

/// Run [`Gate::cleanup_expired_data`] every `every`, first after one full
/// period. Abort the returned handle to stop.
pub fn spawn_cleanup(gate: Arc<Gate>, every: Duration) -> JoinHandle<()> {
    let mut ticker = interval_at(Instant::now() + every, every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!("cleanup scheduled every {} seconds", every.as_secs());

    tokio::spawn(async move {
        loop {
            ticker.tick().await;
            gate.cleanup_expired_data();
        }
    })
}
