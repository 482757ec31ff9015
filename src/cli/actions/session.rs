use crate::cli::globals::GlobalArgs;
use crate::gate::Session;
use anyhow::{anyhow, Result};
use secrecy::{ExposeSecret, SecretString};
use std::fmt::Write;

#[derive(Debug)]
pub struct LoginArgs {
    pub globals: GlobalArgs,
    pub code: SecretString,
}

/// `23h 59m` style countdown.
#[must_use]
pub fn format_remaining(ms: i64) -> String {
    let minutes = ms.max(0) / 60_000;
    format!("{}h {:02}m", minutes / 60, minutes % 60)
}

/// Human-readable summary of a session.
#[must_use]
pub fn describe(session: &Session, now_ms: i64) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "User:        {} ({})", session.user.name, session.user.tier);
    let _ = writeln!(out, "Access code: {}", session.masked_access_code());
    let _ = writeln!(out, "Permissions: {}", session.permissions.join(", "));
    let _ = writeln!(
        out,
        "Usage:       {}/{} ({}%)",
        session.usage_count,
        session.max_usage,
        session.usage_percentage()
    );
    let _ = write!(
        out,
        "Expires in:  {}",
        format_remaining(session.time_remaining_ms(now_ms))
    );
    out
}

/// Authenticate once and print the stored session.
///
/// # Errors
/// Returns the denial message when access is not granted.
pub async fn login(args: LoginArgs) -> Result<()> {
    let gate = args.globals.gate();
    let outcome = gate.authenticate(args.code.expose_secret()).await;

    let Some(session) = outcome.session() else {
        return Err(anyhow!("{}", outcome.message()));
    };

    println!("{}", outcome.message());
    println!("{}", describe(session, gate.now_ms()));
    Ok(())
}

/// Print the active session.
///
/// # Errors
/// Returns an error when no active session is stored.
pub fn status(globals: &GlobalArgs) -> Result<()> {
    let gate = globals.gate();
    let session = gate
        .restore()
        .ok_or_else(|| anyhow!("No active demo session"))?;
    println!("{}", describe(&session, gate.now_ms()));
    Ok(())
}

pub fn logout(globals: &GlobalArgs) {
    globals.gate().logout();
    println!("Logged out");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::gate::UserProfile;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn remaining_time_format() {
        assert_eq!(format_remaining(86_400_000), "24h 00m");
        assert_eq!(format_remaining(90 * 60_000 + 59_999), "1h 30m");
        assert_eq!(format_remaining(-5), "0h 00m");
    }

    #[test]
    fn describe_masks_the_code() {
        let session = Session {
            access_code: "DEMO_ACCESS_2024".to_string(),
            user: UserProfile {
                name: "Demo User".to_string(),
                tier: "standard".to_string(),
            },
            permissions: vec!["basic_demo".to_string()],
            usage_count: 1,
            max_usage: 100,
            expires_at: NOW + 86_400_000,
            created_at: NOW,
        };
        let text = describe(&session, NOW);
        assert!(text.contains("Demo User (standard)"));
        assert!(text.contains("DEMO••••••••"));
        assert!(!text.contains("DEMO_ACCESS_2024"));
        assert!(text.contains("1/100 (1%)"));
        assert!(text.ends_with("24h 00m"));
    }

    #[tokio::test]
    async fn login_status_logout_share_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let globals = GlobalArgs::new(dir.path().join("storage.json")).with_no_delay(true);

        login(LoginArgs {
            globals: globals.clone(),
            code: SecretString::from("helios2024vip".to_string()),
        })
        .await
        .unwrap();
        assert!(status(&globals).is_ok());

        logout(&globals);
        assert!(status(&globals).is_err());
    }

    #[tokio::test]
    async fn login_denial_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let globals = GlobalArgs::new(dir.path().join("storage.json")).with_no_delay(true);

        let err = login(LoginArgs {
            globals,
            code: SecretString::from("NOPE".to_string()),
        })
        .await
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid access code. Please check your code and try again."
        );
    }
}
