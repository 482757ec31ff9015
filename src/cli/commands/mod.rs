pub mod logging;
pub mod storage;

use crate::dashboard::DEFAULT_BACKEND_URL;
use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ArgAction, ColorChoice, Command,
};

pub const CMD_LOGIN: &str = "login";
pub const CMD_STATUS: &str = "status";
pub const CMD_LOGOUT: &str = "logout";
pub const CMD_USAGE: &str = "usage";
pub const CMD_CODES: &str = "codes";
pub const CMD_CLEANUP: &str = "cleanup";
pub const CMD_GATE: &str = "gate";
pub const CMD_DASHBOARD: &str = "dashboard";

pub const ARG_CODE: &str = "code";
pub const ARG_CLEANUP_INTERVAL: &str = "cleanup-interval";
pub const ARG_BACKEND_URL: &str = "backend-url";
pub const ARG_INTERVAL: &str = "interval";
pub const ARG_ONCE: &str = "once";

const USAGE_ABOUT: &str = "Show usage statistics for an access code.\n\n\
Usage counters live for one process only, so a standalone run reports no \
usage. Inside `helios-gate gate`, type `usage` to see the counters of the \
active session.";

fn code_arg() -> Arg {
    Arg::new(ARG_CODE)
        .help("Demo access code")
        .env("HELIOS_ACCESS_CODE")
        .hide_env_values(true)
        .required(true)
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("helios-gate")
        .about("Demo access gate for Helios")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new(CMD_LOGIN)
                .about("Authenticate with an access code and store the session")
                .arg(code_arg()),
        )
        .subcommand(Command::new(CMD_STATUS).about("Show the stored session"))
        .subcommand(Command::new(CMD_LOGOUT).about("Clear the stored session"))
        .subcommand(
            Command::new(CMD_USAGE)
                .about("Show usage statistics for an access code")
                .long_about(USAGE_ABOUT)
                .arg(code_arg()),
        )
        .subcommand(Command::new(CMD_CODES).about("List the demo access codes"))
        .subcommand(Command::new(CMD_CLEANUP).about("Remove expired data from storage"))
        .subcommand(
            Command::new(CMD_GATE)
                .about("Read access codes from stdin in a single session")
                .arg(
                    Arg::new(ARG_CLEANUP_INTERVAL)
                        .long(ARG_CLEANUP_INTERVAL)
                        .help("Seconds between cleanup sweeps")
                        .env("HELIOS_CLEANUP_INTERVAL")
                        .default_value("900")
                        .value_parser(clap::value_parser!(u64).range(1..)),
                ),
        )
        .subcommand(
            Command::new(CMD_DASHBOARD)
                .about("Poll the demo backend and print live KPIs")
                .arg(
                    Arg::new(ARG_BACKEND_URL)
                        .long(ARG_BACKEND_URL)
                        .help("Base URL of the demo backend")
                        .env("HELIOS_DEMO_URL")
                        .default_value(DEFAULT_BACKEND_URL),
                )
                .arg(
                    Arg::new(ARG_INTERVAL)
                        .long(ARG_INTERVAL)
                        .help("Seconds between polls")
                        .env("HELIOS_DASHBOARD_INTERVAL")
                        .default_value("30")
                        .value_parser(clap::value_parser!(u64).range(1..)),
                )
                .arg(
                    Arg::new(ARG_ONCE)
                        .long(ARG_ONCE)
                        .help("Print a single snapshot and exit")
                        .action(ArgAction::SetTrue),
                ),
        );

    let command = storage::with_args(command);
    logging::with_args(command)
}
