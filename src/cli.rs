//! Command-line interface for the Just Weather client
//!
//! The one-shot surface is parsed by clap; the interactive prompt reuses the
//! same `Command` enum through a whitespace token parser, so both entry
//! points dispatch identically.

use clap::{Parser, Subcommand};
use thiserror::Error;

/// Errors from parsing an interactive command line
#[derive(Debug, Error)]
pub enum CliError {
    /// The line contained no tokens
    #[error("empty command")]
    EmptyCommand,

    /// The first token is not a known command
    #[error("unknown command: '{0}' (try 'help')")]
    UnknownCommand(String),

    /// Wrong argument count for a known command
    #[error("usage: {0}")]
    Usage(&'static str),

    /// An argument that should be numeric is not
    #[error("invalid number: '{0}'")]
    InvalidNumber(String),
}

/// Just Weather CLI - query the Just Weather API from the terminal
#[derive(Parser, Debug)]
#[command(name = "just-weather")]
#[command(about = "Just Weather API client")]
#[command(version)]
pub struct Cli {
    /// API server host
    #[arg(long, default_value = "localhost")]
    pub host: String,

    /// API server port
    #[arg(long, default_value_t = 10680)]
    pub port: u16,

    /// Request timeout in milliseconds
    #[arg(long, default_value_t = 5000)]
    pub timeout_ms: u64,

    #[command(subcommand)]
    pub command: Command,
}

/// A single client operation
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Current weather by coordinates
    #[command(allow_negative_numbers = true)]
    Current { lat: f64, lon: f64 },

    /// Weather by city name
    Weather {
        city: String,
        /// Optional country filter
        #[arg(long)]
        country: Option<String>,
        /// Optional region filter
        #[arg(long)]
        region: Option<String>,
    },

    /// Search cities matching a query
    Cities { query: String },

    /// Fetch the API homepage document
    Homepage,

    /// Round-trip test against the echo endpoint
    Echo,

    /// Remove every cached response
    ClearCache,

    /// Start the interactive prompt
    Interactive,
}

impl Command {
    /// Parses one tokenized interactive line.
    ///
    /// The interactive grammar is positional: optional city filters are
    /// passed as `weather <city> [country] [region]`. `interactive` itself
    /// is not a valid command inside the prompt.
    pub fn parse_tokens(tokens: &[&str]) -> Result<Self, CliError> {
        let (&name, args) = tokens.split_first().ok_or(CliError::EmptyCommand)?;

        match name {
            "current" => match args {
                [lat, lon] => Ok(Command::Current {
                    lat: parse_number(lat)?,
                    lon: parse_number(lon)?,
                }),
                _ => Err(CliError::Usage("current <lat> <lon>")),
            },
            "weather" => match args {
                [city] => Ok(Command::Weather {
                    city: city.to_string(),
                    country: None,
                    region: None,
                }),
                [city, country] => Ok(Command::Weather {
                    city: city.to_string(),
                    country: Some(country.to_string()),
                    region: None,
                }),
                [city, country, region] => Ok(Command::Weather {
                    city: city.to_string(),
                    country: Some(country.to_string()),
                    region: Some(region.to_string()),
                }),
                _ => Err(CliError::Usage("weather <city> [country] [region]")),
            },
            "cities" => match args {
                [query] => Ok(Command::Cities {
                    query: query.to_string(),
                }),
                _ => Err(CliError::Usage("cities <query>")),
            },
            "homepage" => match args {
                [] => Ok(Command::Homepage),
                _ => Err(CliError::Usage("homepage")),
            },
            "echo" => match args {
                [] => Ok(Command::Echo),
                _ => Err(CliError::Usage("echo")),
            },
            "clear-cache" => match args {
                [] => Ok(Command::ClearCache),
                _ => Err(CliError::Usage("clear-cache")),
            },
            other => Err(CliError::UnknownCommand(other.to_string())),
        }
    }
}

fn parse_number(token: &str) -> Result<f64, CliError> {
    token
        .parse()
        .map_err(|_| CliError::InvalidNumber(token.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_current() {
        let cli = Cli::parse_from(["just-weather", "current", "49.28", "-123.12"]);
        assert_eq!(
            cli.command,
            Command::Current {
                lat: 49.28,
                lon: -123.12
            }
        );
        assert_eq!(cli.host, "localhost");
        assert_eq!(cli.port, 10680);
        assert_eq!(cli.timeout_ms, 5000);
    }

    #[test]
    fn test_cli_parse_weather_with_filters() {
        let cli = Cli::parse_from([
            "just-weather",
            "weather",
            "Vancouver",
            "--country",
            "CA",
            "--region",
            "BC",
        ]);
        assert_eq!(
            cli.command,
            Command::Weather {
                city: "Vancouver".to_string(),
                country: Some("CA".to_string()),
                region: Some("BC".to_string()),
            }
        );
    }

    #[test]
    fn test_cli_parse_global_flags() {
        let cli = Cli::parse_from([
            "just-weather",
            "--host",
            "weather.example",
            "--port",
            "8080",
            "--timeout-ms",
            "250",
            "homepage",
        ]);
        assert_eq!(cli.host, "weather.example");
        assert_eq!(cli.port, 8080);
        assert_eq!(cli.timeout_ms, 250);
        assert_eq!(cli.command, Command::Homepage);
    }

    #[test]
    fn test_cli_parse_missing_subcommand_fails() {
        assert!(Cli::try_parse_from(["just-weather"]).is_err());
    }

    #[test]
    fn test_cli_parse_bad_coordinates_fail() {
        assert!(Cli::try_parse_from(["just-weather", "current", "abc", "0"]).is_err());
    }

    #[test]
    fn test_parse_tokens_current() {
        let command = Command::parse_tokens(&["current", "49.28", "-123.12"]).unwrap();
        assert_eq!(
            command,
            Command::Current {
                lat: 49.28,
                lon: -123.12
            }
        );
    }

    #[test]
    fn test_parse_tokens_current_bad_number() {
        let result = Command::parse_tokens(&["current", "abc", "0"]);
        assert!(matches!(result, Err(CliError::InvalidNumber(_))));
    }

    #[test]
    fn test_parse_tokens_current_wrong_arity() {
        assert!(matches!(
            Command::parse_tokens(&["current", "49.28"]),
            Err(CliError::Usage(_))
        ));
        assert!(matches!(
            Command::parse_tokens(&["current"]),
            Err(CliError::Usage(_))
        ));
    }

    #[test]
    fn test_parse_tokens_weather_variants() {
        assert_eq!(
            Command::parse_tokens(&["weather", "Vancouver"]).unwrap(),
            Command::Weather {
                city: "Vancouver".to_string(),
                country: None,
                region: None,
            }
        );
        assert_eq!(
            Command::parse_tokens(&["weather", "Vancouver", "CA", "BC"]).unwrap(),
            Command::Weather {
                city: "Vancouver".to_string(),
                country: Some("CA".to_string()),
                region: Some("BC".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_tokens_simple_commands() {
        assert_eq!(
            Command::parse_tokens(&["cities", "van"]).unwrap(),
            Command::Cities {
                query: "van".to_string()
            }
        );
        assert_eq!(Command::parse_tokens(&["homepage"]).unwrap(), Command::Homepage);
        assert_eq!(Command::parse_tokens(&["echo"]).unwrap(), Command::Echo);
        assert_eq!(
            Command::parse_tokens(&["clear-cache"]).unwrap(),
            Command::ClearCache
        );
    }

    #[test]
    fn test_parse_tokens_unknown_and_empty() {
        assert!(matches!(
            Command::parse_tokens(&["frobnicate"]),
            Err(CliError::UnknownCommand(_))
        ));
        assert!(matches!(
            Command::parse_tokens(&[]),
            Err(CliError::EmptyCommand)
        ));
        assert!(matches!(
            Command::parse_tokens(&["interactive"]),
            Err(CliError::UnknownCommand(_))
        ));
    }
}
