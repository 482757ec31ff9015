use super::session::describe;
use crate::cli::globals::GlobalArgs;
use crate::gate::{spawn_cleanup, Gate};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

const PROMPT: &str = "Enter an access code (status, usage, logout, quit):";

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub cleanup_interval: Duration,
}

/// Handle one line of input. Returns `None` when the user asks to quit.
pub async fn handle_line(gate: &Gate, line: &str) -> Option<String> {
    let reply = match line.trim() {
        "" => String::new(),
        "quit" | "exit" => return None,
        "status" => gate.restore().map_or_else(
            || "No active demo session".to_string(),
            |session| describe(&session, gate.now_ms()),
        ),
        "usage" => match gate.restore() {
            Some(session) => serde_json::to_string_pretty(&gate.usage_stats(&session.access_code))
                .unwrap_or_else(|e| format!("Failed to encode usage: {e}")),
            None => "No active demo session".to_string(),
        },
        "logout" => {
            gate.logout();
            "Logged out".to_string()
        }
        code => {
            let outcome = gate.authenticate(code).await;
            match outcome.session() {
                Some(session) => format!(
                    "{}\n{}",
                    outcome.message(),
                    describe(session, gate.now_ms())
                ),
                None => outcome.message().to_string(),
            }
        }
    };
    Some(reply)
}

/// Interactive gate over stdin. Limiter state lasts for the whole loop and
/// the cleanup task runs alongside it.
///
/// # Errors
/// Returns an error if stdin cannot be read.
pub async fn execute(args: Args) -> Result<()> {
    let gate = Arc::new(args.globals.gate());
    let cleanup = spawn_cleanup(gate.clone(), args.cleanup_interval);

    if let Some(session) = gate.restore() {
        println!("Welcome back {}!", session.user.name);
    }
    println!("{PROMPT}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };
        match handle_line(&gate, &line).await {
            Some(reply) if reply.is_empty() => {}
            Some(reply) => println!("{reply}"),
            None => break,
        }
    }

    cleanup.abort();
    info!("gate closed");
    Ok(())
}
