use clap::{builder::ValueParser, Arg, Command};

pub const ARG_VERBOSITY: &str = "verbosity";

#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
            .env("HELIOS_LOG_LEVEL")
            .global(true)
            .action(clap::ArgAction::Count)
            .value_parser(validator_log_level()),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn log_level_names_map_to_counts() {
        temp_env::with_var("HELIOS_LOG_LEVEL", Some("debug"), || {
            let matches = with_args(Command::new("helios-gate")).get_matches_from(["helios-gate"]);
            assert_eq!(matches.get_one::<u8>(ARG_VERBOSITY).copied(), Some(3));
        });
    }

    #[test]
    fn repeated_flag_counts() {
        temp_env::with_var("HELIOS_LOG_LEVEL", None::<&str>, || {
            let matches =
                with_args(Command::new("helios-gate")).get_matches_from(["helios-gate", "-vv"]);
            assert_eq!(matches.get_one::<u8>(ARG_VERBOSITY).copied(), Some(2));
        });
    }

    #[test]
    fn rejects_unknown_level() {
        temp_env::with_var("HELIOS_LOG_LEVEL", Some("loud"), || {
            let result =
                with_args(Command::new("helios-gate")).try_get_matches_from(["helios-gate"]);
            assert!(result.is_err());
        });
    }
}
