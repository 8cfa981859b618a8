//! Just Weather CLI - query the Just Weather API from the terminal
//!
//! One-shot subcommands print the response document as pretty JSON and set
//! an exit code; `interactive` starts a prompt loop that keeps running
//! across per-command failures.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use just_weather::api::{ClientConfig, ClientError, WeatherClient};
use just_weather::cli::{Cli, Command};

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    let config = ClientConfig {
        host: cli.host.clone(),
        port: cli.port,
        timeout: Duration::from_millis(cli.timeout_ms),
    };
    let mut client = WeatherClient::new(config);

    match cli.command {
        Command::Interactive => run_interactive(&mut client),
        command => match execute(&mut client, &command) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("{e}");
                ExitCode::from(exit_code(&e))
            }
        },
    }
}

/// Runs one command against the client and prints its result.
fn execute(client: &mut WeatherClient, command: &Command) -> Result<(), ClientError> {
    let document = match command {
        Command::Current { lat, lon } => client.current(*lat, *lon)?,
        Command::Weather {
            city,
            country,
            region,
        } => client.weather_by_city(city, country.as_deref(), region.as_deref())?,
        Command::Cities { query } => client.search_cities(query)?,
        Command::Homepage => client.homepage()?,
        Command::Echo => client.echo()?,
        Command::ClearCache => {
            client.clear_cache();
            println!("Cache cleared");
            return Ok(());
        }
        // Handled by main before dispatch
        Command::Interactive => return Ok(()),
    };

    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}

/// Prompt loop: reads lines until EOF or `quit`/`exit`, parsing each into
/// the same command enum the one-shot surface uses. A failed command prints
/// its error and the loop continues.
fn run_interactive(client: &mut WeatherClient) -> ExitCode {
    println!("Just Weather Interactive Client");

    let stdin = io::stdin();
    loop {
        print!("just-weather> ");
        let _ = io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }
        if line == "help" {
            print_help();
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        match Command::parse_tokens(&tokens) {
            Ok(command) => {
                if let Err(e) = execute(client, &command) {
                    eprintln!("{e}");
                }
            }
            Err(e) => eprintln!("{e}"),
        }
    }

    ExitCode::SUCCESS
}

fn print_help() {
    println!(
        "Commands:\n\
         \x20 current <lat> <lon>              current weather by coordinates\n\
         \x20 weather <city> [country] [region]  weather by city name\n\
         \x20 cities <query>                   search cities\n\
         \x20 homepage                         API homepage document\n\
         \x20 echo                             echo endpoint round-trip\n\
         \x20 clear-cache                      remove every cached response\n\
         \x20 help                             show this message\n\
         \x20 quit                             leave the prompt"
    );
}

/// Exit code for a failed one-shot command: 1 for invalid arguments, 2 for
/// network failures, 3 for server-side errors.
fn exit_code(error: &ClientError) -> u8 {
    match error {
        ClientError::InvalidCoordinates
        | ClientError::InvalidCityName
        | ClientError::QueryTooShort => 1,
        ClientError::Http(_) => 2,
        ClientError::Status(_)
        | ClientError::Api(_)
        | ClientError::EmptyResponse
        | ClientError::Json(_) => 3,
    }
}
