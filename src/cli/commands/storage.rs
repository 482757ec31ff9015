use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;

pub const ARG_STORAGE: &str = "storage";
pub const ARG_NO_DELAY: &str = "no-delay";

pub const DEFAULT_STORAGE: &str = ".helios-storage.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub storage: PathBuf,
    pub no_delay: bool,
}

impl Options {
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Self {
        Self {
            storage: matches
                .get_one::<PathBuf>(ARG_STORAGE)
                .cloned()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE)),
            no_delay: matches.get_flag(ARG_NO_DELAY),
        }
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_STORAGE)
                .long(ARG_STORAGE)
                .help("File holding the persisted demo session")
                .env("HELIOS_STORAGE")
                .default_value(DEFAULT_STORAGE)
                .global(true)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new(ARG_NO_DELAY)
                .long(ARG_NO_DELAY)
                .help("Skip the simulated validation delay")
                .env("HELIOS_NO_DELAY")
                .global(true)
                .action(ArgAction::SetTrue),
        )
}
