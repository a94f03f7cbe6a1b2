//! Kinship server CLI
//!
//! Starts the HTTP server for the friend-relationship API.

use kinship_server::{config::ServerConfig, start_server, ServerError};
use std::env;
use std::process;

const USAGE: &str = "Usage: kinship-server [--config <path-to-config.toml>]";

const HELP: &str = "\
Kinship Server - Friend Relationship API

USAGE:
    kinship-server [--config <path-to-config.toml>]

OPTIONS:
    --config <file>    Load configuration from TOML file
    --help             Print this help message

Without --config the server runs on an in-memory database with two
seeded development users.

CONFIGURATION KEYS:
    bind_address       IP address to bind, required
    bind_port          Port number, required
    jwt_secret         HS256 signing secret, must not be empty
    database_path      SQLite file (default: kinship.db)
    token_expiry_secs  Session lifetime in seconds (default: 3600)
    log_filter         Tracing filter, RUST_LOG wins (default: info)
    busy_timeout_ms    SQLite busy timeout (default: 5000)
    [[users]]          Profiles seeded at startup (id, contact, display_name)
";

/// What the command line asks for
#[derive(Debug, PartialEq, Eq)]
enum Command {
    /// Serve, from a config file or the development defaults
    Run(Option<String>),
    Help,
}

fn parse_args(args: &[String]) -> Result<Command, ServerError> {
    let mut config_path = None;
    let mut rest = args.iter();
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(Command::Help),
            "--config" => {
                let path = rest.next().ok_or_else(|| {
                    ServerError::Usage(format!("--config needs a path\n{}", USAGE))
                })?;
                if config_path.replace(path.clone()).is_some() {
                    return Err(ServerError::Usage(format!("--config given twice\n{}", USAGE)));
                }
            }
            other => {
                return Err(ServerError::Usage(format!("unknown argument '{}'\n{}", other, USAGE)));
            }
        }
    }
    Ok(Command::Run(config_path))
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(match e {
            ServerError::Usage(_) => 2,
            _ => 1,
        });
    }
}

async fn run() -> Result<(), ServerError> {
    let args: Vec<String> = env::args().skip(1).collect();

    let config = match parse_args(&args)? {
        Command::Help => {
            print!("{}", HELP);
            return Ok(());
        }
        Command::Run(Some(path)) => ServerConfig::from_file(&path)?,
        Command::Run(None) => {
            eprintln!("Warning: no config file given, using the in-memory development config");
            ServerConfig::default_test_config()
        }
    };

    start_server(config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_arguments_runs_development_config() {
        assert_eq!(parse_args(&[]).unwrap(), Command::Run(None));
    }

    #[test]
    fn test_config_path() {
        let parsed = parse_args(&args(&["--config", "kinship.toml"])).unwrap();
        assert_eq!(parsed, Command::Run(Some("kinship.toml".to_string())));
    }

    #[test]
    fn test_help_wins() {
        assert_eq!(parse_args(&args(&["--help"])).unwrap(), Command::Help);
        assert_eq!(parse_args(&args(&["--config", "a.toml", "-h"])).unwrap(), Command::Help);
    }

    #[test]
    fn test_unknown_flag_is_reported() {
        let err = parse_args(&args(&["--cfg", "kinship.toml"])).unwrap_err();
        assert!(matches!(err, ServerError::Usage(_)));
        assert!(err.to_string().contains("unknown argument '--cfg'"));
    }

    #[test]
    fn test_missing_config_value_is_reported() {
        let err = parse_args(&args(&["--config"])).unwrap_err();
        assert!(err.to_string().starts_with("--config needs a path"));
    }

    #[test]
    fn test_repeated_config_is_reported() {
        let err = parse_args(&args(&["--config", "a.toml", "--config", "b.toml"])).unwrap_err();
        assert!(err.to_string().contains("given twice"));
    }
}
