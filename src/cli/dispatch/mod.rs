//! Map parsed command-line arguments to an [`Action`].

use crate::cli::actions::{codes::UsageArgs, dashboard, gate, session::LoginArgs, Action};
use crate::cli::commands::{
    storage, ARG_BACKEND_URL, ARG_CLEANUP_INTERVAL, ARG_CODE, ARG_INTERVAL, ARG_ONCE, CMD_CLEANUP,
    CMD_CODES, CMD_DASHBOARD, CMD_GATE, CMD_LOGIN, CMD_LOGOUT, CMD_STATUS, CMD_USAGE,
};
use crate::cli::globals::GlobalArgs;
use crate::dashboard::DEFAULT_BACKEND_URL;
use anyhow::{anyhow, Context, Result};
use clap::ArgMatches;
use secrecy::SecretString;
use std::time::Duration;

fn globals(matches: &ArgMatches) -> GlobalArgs {
    let options = storage::Options::parse(matches);
    GlobalArgs::new(options.storage).with_no_delay(options.no_delay)
}

fn code(matches: &ArgMatches) -> Result<SecretString> {
    matches
        .get_one::<String>(ARG_CODE)
        .cloned()
        .map(SecretString::from)
        .context("missing required argument: <code>")
}

fn seconds(matches: &ArgMatches, id: &str, default: u64) -> Duration {
    Duration::from_secs(matches.get_one::<u64>(id).copied().unwrap_or(default))
}

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if the subcommand is unknown or a required argument is
/// missing.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    let Some((name, sub)) = matches.subcommand() else {
        return Err(anyhow!("missing subcommand"));
    };

    let action = match name {
        CMD_LOGIN => Action::Login(LoginArgs {
            globals: globals(sub),
            code: code(sub)?,
        }),
        CMD_STATUS => Action::Status(globals(sub)),
        CMD_LOGOUT => Action::Logout(globals(sub)),
        CMD_USAGE => Action::Usage(UsageArgs {
            globals: globals(sub),
            code: code(sub)?,
        }),
        CMD_CODES => Action::Codes,
        CMD_CLEANUP => Action::Cleanup(globals(sub)),
        CMD_GATE => Action::Gate(gate::Args {
            globals: globals(sub),
            cleanup_interval: seconds(sub, ARG_CLEANUP_INTERVAL, 900),
        }),
        CMD_DASHBOARD => Action::Dashboard(dashboard::Args {
            globals: globals(sub),
            backend_url: sub
                .get_one::<String>(ARG_BACKEND_URL)
                .cloned()
                .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string()),
            interval: seconds(sub, ARG_INTERVAL, 30),
            once: sub.get_flag(ARG_ONCE),
        }),
        other => return Err(anyhow!("unknown subcommand: {other}")),
    };

    Ok(action)
}
