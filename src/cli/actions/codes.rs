use crate::cli::globals::GlobalArgs;
use crate::gate::AccessCodeTable;
use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};
use std::fmt::Write;

#[derive(Debug)]
pub struct UsageArgs {
    pub globals: GlobalArgs,
    pub code: SecretString,
}

/// One line per code: code, tier, lifetime ceiling, window policy and
/// description.
#[must_use]
pub fn render_table(codes: &AccessCodeTable) -> String {
    let mut out = String::new();
    for (code, record) in codes.iter() {
        let _ = writeln!(
            out,
            "{code:<18} {:<11} {:>5} uses  {:>3}/{}s  {}",
            record.user.tier,
            record.max_usage,
            record.rate_limit.requests_per_window,
            record.rate_limit.window_duration_ms / 1000,
            record.description
        );
    }
    out
}

/// # Errors
/// Never fails; returns `Result` for a uniform action signature.
pub fn list() -> Result<()> {
    print!("{}", render_table(&AccessCodeTable::presets()));
    Ok(())
}

/// Print usage statistics for a code as JSON.
///
/// # Errors
/// Returns an error if the statistics cannot be serialized.
pub fn usage(args: &UsageArgs) -> Result<()> {
    let stats = args.globals.gate().usage_stats(args.code.expose_secret());
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
