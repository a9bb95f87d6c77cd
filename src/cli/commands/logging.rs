use crate::cli::telemetry::LogFormat;
use clap::{Arg, ArgMatches, Command, builder::PossibleValuesParser, builder::ValueParser};

pub const ARG_VERBOSITY: &str = "verbosity";
pub const ARG_LOG_FORMAT: &str = "log-format";
pub const ARG_OTLP_ENDPOINT: &str = "otlp-endpoint";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub verbosity: u8,
    pub format: LogFormat,
    pub otlp_endpoint: Option<String>,
}

impl Options {
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Self {
        Self {
            verbosity: matches.get_one::<u8>(ARG_VERBOSITY).copied().unwrap_or(0),
            format: matches
                .get_one::<String>(ARG_LOG_FORMAT)
                .and_then(|value| LogFormat::parse(value))
                .unwrap_or_default(),
            otlp_endpoint: matches
                .get_one::<String>(ARG_OTLP_ENDPOINT)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
        }
    }
}

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
    command
        .arg(
            Arg::new(ARG_VERBOSITY)
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("USERDESK_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
        .arg(
            Arg::new(ARG_LOG_FORMAT)
                .long(ARG_LOG_FORMAT)
                .help("Log line format")
                .env("USERDESK_LOG_FORMAT")
                .global(true)
                .default_value("compact")
                .value_parser(PossibleValuesParser::new(["compact", "json"])),
        )
        .arg(
            Arg::new(ARG_OTLP_ENDPOINT)
                .long(ARG_OTLP_ENDPOINT)
                .help("OTLP gRPC collector endpoint; span export is off when unset")
                .env("USERDESK_OTLP_ENDPOINT")
                .global(true),
        )
}
