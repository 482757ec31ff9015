#![allow(clippy::unwrap_used)]

use helios_gate::gate::{
    demo_codes, FileStorage, Gate, GateConfig, LocalStorage, ManualClock, NoDelay, SESSION_KEY,
};
use std::sync::Arc;

const NOW: i64 = 1_735_689_600_000;
const DAY_MS: i64 = 86_400_000;

fn gate_over(path: &std::path::Path, clock: Arc<ManualClock>) -> Gate {
    Gate::builder(Arc::new(FileStorage::new(path)))
        .clock(clock)
        .delay(Arc::new(NoDelay))
        .build()
}

#[tokio::test]
async fn standard_code_walkthrough() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");
    let clock = Arc::new(ManualClock::new(NOW));
    let gate = gate_over(&path, clock.clone());

    let validation = gate.validate("demo_access_2024").await;
    assert!(validation.valid);
    assert_eq!(validation.message, "Welcome Demo User! Access granted.");

    let outcome = gate.authenticate("demo_access_2024").await;
    assert!(outcome.is_granted());
    let session = outcome.session().unwrap();
    assert_eq!(session.usage_count, 1);
    assert_eq!(session.expires_at, NOW + DAY_MS);

    // Nineteen more fit in the 20-per-minute window.
    for _ in 0..19 {
        assert!(gate.check_and_consume(demo_codes::STANDARD).allowed);
    }
    let denied = gate.check_and_consume(demo_codes::STANDARD);
    assert!(!denied.allowed);
    assert_eq!(denied.usage_count, 20);
    assert_eq!(
        denied.message.as_deref(),
        Some("Rate limit exceeded. Try again in 1 minutes.")
    );

    clock.advance(60_000);
    assert!(gate.check_and_consume(demo_codes::STANDARD).allowed);

    let stats = gate.usage_stats(demo_codes::STANDARD);
    assert_eq!(stats.usage_count, 21);
    assert!((stats.percentage - 21.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn session_survives_a_new_gate_until_expiry() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");
    let clock = Arc::new(ManualClock::new(NOW));

    gate_over(&path, clock.clone())
        .authenticate(demo_codes::VIP)
        .await;

    let reopened = gate_over(&path, clock.clone());
    let session = reopened.restore().unwrap();
    assert_eq!(session.user.name, "VIP User");
    // Limiter state is per process; the file only carries the session.
    assert_eq!(reopened.usage_stats(demo_codes::VIP).usage_count, 0);

    clock.advance(DAY_MS);
    assert!(reopened.restore().is_none());
    assert_eq!(FileStorage::new(&path).get_item(SESSION_KEY).unwrap(), None);
}

#[tokio::test]
async fn expired_marker_blocks_until_cleanup() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");
    let clock = Arc::new(ManualClock::new(NOW));
    let gate = gate_over(&path, clock);

    let storage = FileStorage::new(&path);
    storage
        .set_item(
            "session_BETA_TESTER_2024",
            &format!("{{\"expiresAt\":{}}}", NOW - 1),
        )
        .unwrap();
    storage
        .set_item(
            "session_CONF2024_HELIOS",
            &format!("{{\"expiresAt\":{}}}", NOW - 1),
        )
        .unwrap();

    let result = gate.validate(demo_codes::BETA).await;
    assert!(!result.valid);
    assert_eq!(
        result.message,
        "Access code has expired. Please request a new code."
    );
    assert!(gate.validate(demo_codes::BETA).await.valid);

    let report = gate.cleanup_expired_data();
    assert_eq!(report.sessions_removed, 1);
    assert!(gate.validate(demo_codes::CONFERENCE).await.valid);
}

#[tokio::test]
async fn shortened_session_ttl() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(NOW));
    let gate = Gate::builder(Arc::new(FileStorage::new(dir.path().join("s.json"))))
        .config(GateConfig::new().with_session_ttl_ms(1_000))
        .clock(clock.clone())
        .delay(Arc::new(NoDelay))
        .build();

    gate.authenticate(demo_codes::DEVELOPER).await;
    clock.advance(999);
    assert!(gate.restore().is_some());
    clock.advance(1);
    assert!(gate.restore().is_none());
}
