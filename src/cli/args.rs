//! Command-line argument parsing for the `firebase` CLI.
//!
//! This module handles parsing command-line arguments and determining
//! which CLI command to execute.

use std::path::PathBuf;
use thiserror::Error;

use crate::sse::EventType;

/// Usage text printed by `--help`.
pub const USAGE: &str = "\
usage: firebase [--url URL] [--creds FILE] <command>

commands:
  get <path> [--shallow]                 print the value at path
  monitor <path> [--listen] [--events T] stream changes at path
  rules get                              print the security rules
  rules set <file>                       replace the security rules
  rules clear                            deny all reads and writes
  push-id [count]                        generate push ids locally

options:
  --url URL      database url (env: FIREBASE_URL)
  --creds FILE   service account key file (env: FIREBASE_CREDENTIALS)
  -h, --help     show this help
  -V, --version  show version";

/// Options shared by every command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalOptions {
    pub url: Option<String>,
    pub credentials: Option<PathBuf>,
}

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Read a location and pretty-print it
    Get { path: String, shallow: bool },
    /// Print change events for a location
    Monitor {
        path: String,
        /// Reconnect when the stream ends instead of exiting
        listen: bool,
        /// Event types printed in listen mode
        events: Vec<EventType>,
    },
    RulesGet,
    RulesSet { file: PathBuf },
    RulesClear,
    PushId { count: usize },
}

/// Parsed command line.
#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    pub global: GlobalOptions,
    pub command: CliCommand,
}

/// Errors found while parsing arguments.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArgsError {
    #[error("no command given")]
    NoCommand,
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("unknown option: {0}")]
    UnknownOption(String),
    #[error("missing value for {0}")]
    MissingValue(String),
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),
    #[error("unexpected argument: {0}")]
    UnexpectedArgument(String),
    #[error("invalid count: {0}")]
    InvalidCount(String),
}

/// Parse command-line arguments, program name first.
///
/// # Examples
///
/// ```
/// use firebase_rtdb::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["firebase".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()).unwrap().command, CliCommand::Version);
/// ```
pub fn parse_args<I>(args: I) -> Result<CliArgs, ArgsError>
where
    I: Iterator<Item = String>,
{
    let mut args = args.skip(1);
    let mut global = GlobalOptions::default();

    let command = loop {
        let Some(arg) = args.next() else {
            return Err(ArgsError::NoCommand);
        };
        match arg.as_str() {
            "--version" | "-V" => break "version".to_string(),
            "--help" | "-h" => break "help".to_string(),
            "--url" => global.url = Some(value(&mut args, &arg)?),
            "--creds" | "--credentials" => {
                global.credentials = Some(PathBuf::from(value(&mut args, &arg)?))
            }
            flag if flag.starts_with('-') => {
                return Err(ArgsError::UnknownOption(arg));
            }
            _ => break arg,
        }
    };

    let rest: Vec<String> = args.collect();
    let command = match command.as_str() {
        "version" => CliCommand::Version,
        "help" => CliCommand::Help,
        "get" => parse_get(rest)?,
        "monitor" => parse_monitor(rest)?,
        "rules" => parse_rules(rest)?,
        "push-id" => parse_push_id(rest)?,
        _ => return Err(ArgsError::UnknownCommand(command)),
    };

    Ok(CliArgs { global, command })
}

fn value<I: Iterator<Item = String>>(args: &mut I, flag: &str) -> Result<String, ArgsError> {
    args.next()
        .ok_or_else(|| ArgsError::MissingValue(flag.to_string()))
}

fn parse_get(args: Vec<String>) -> Result<CliCommand, ArgsError> {
    let mut path = None;
    let mut shallow = false;

    for arg in args {
        match arg.as_str() {
            "--shallow" => shallow = true,
            flag if flag.starts_with("--") => return Err(ArgsError::UnknownOption(arg)),
            _ if path.is_none() => path = Some(arg),
            _ => return Err(ArgsError::UnexpectedArgument(arg)),
        }
    }

    Ok(CliCommand::Get {
        path: path.unwrap_or_else(|| "/".to_string()),
        shallow,
    })
}

fn parse_monitor(args: Vec<String>) -> Result<CliCommand, ArgsError> {
    let mut path = None;
    let mut listen = false;
    let mut events = vec![EventType::Put, EventType::Patch];

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--listen" => listen = true,
            "--events" => {
                events = value(&mut args, &arg)?
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(EventType::from)
                    .collect();
            }
            flag if flag.starts_with("--") => return Err(ArgsError::UnknownOption(arg)),
            _ if path.is_none() => path = Some(arg),
            _ => return Err(ArgsError::UnexpectedArgument(arg)),
        }
    }

    Ok(CliCommand::Monitor {
        path: path.unwrap_or_else(|| "/".to_string()),
        listen,
        events,
    })
}

fn parse_rules(args: Vec<String>) -> Result<CliCommand, ArgsError> {
    let mut args = args.into_iter();
    let command = match args.next().as_deref() {
        Some("get") => CliCommand::RulesGet,
        Some("clear") => CliCommand::RulesClear,
        Some("set") => {
            let file = args.next().ok_or(ArgsError::MissingArgument("rules file"))?;
            CliCommand::RulesSet {
                file: PathBuf::from(file),
            }
        }
        Some(other) => return Err(ArgsError::UnknownCommand(format!("rules {}", other))),
        None => return Err(ArgsError::MissingArgument("rules subcommand")),
    };

    match args.next() {
        Some(extra) => Err(ArgsError::UnexpectedArgument(extra)),
        None => Ok(command),
    }
}

fn parse_push_id(args: Vec<String>) -> Result<CliCommand, ArgsError> {
    let mut args = args.into_iter();
    let count = match args.next() {
        Some(count) => count
            .parse::<usize>()
            .map_err(|_| ArgsError::InvalidCount(count.clone()))?,
        None => 1,
    };

    match args.next() {
        Some(extra) => Err(ArgsError::UnexpectedArgument(extra)),
        None => Ok(CliCommand::PushId { count }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliArgs, ArgsError> {
        let args: Vec<String> = std::iter::once("firebase")
            .chain(args.iter().copied())
            .map(String::from)
            .collect();
        parse_args(args.into_iter())
    }

    #[test]
    fn test_parse_version_flag() {
        assert_eq!(parse(&["--version"]).unwrap().command, CliCommand::Version);
        assert_eq!(parse(&["-V"]).unwrap().command, CliCommand::Version);
    }

    #[test]
    fn test_parse_help_flag() {
        assert_eq!(parse(&["-h"]).unwrap().command, CliCommand::Help);
    }

    #[test]
    fn test_parse_no_args() {
        assert_eq!(parse(&[]), Err(ArgsError::NoCommand));
    }

    #[test]
    fn test_parse_global_options() {
        let args = parse(&["--url", "https://demo.firebaseio.com/", "--creds", "key.json", "get", "users"])
            .unwrap();
        assert_eq!(args.global.url.as_deref(), Some("https://demo.firebaseio.com/"));
        assert_eq!(args.global.credentials, Some(PathBuf::from("key.json")));
        assert_eq!(
            args.command,
            CliCommand::Get {
                path: "users".to_string(),
                shallow: false
            }
        );
    }

    #[test]
    fn test_parse_missing_option_value() {
        assert_eq!(
            parse(&["--url"]),
            Err(ArgsError::MissingValue("--url".to_string()))
        );
    }

    #[test]
    fn test_parse_get_defaults_to_root() {
        assert_eq!(
            parse(&["get", "--shallow"]).unwrap().command,
            CliCommand::Get {
                path: "/".to_string(),
                shallow: true
            }
        );
    }

    #[test]
    fn test_parse_monitor() {
        assert_eq!(
            parse(&["monitor", "rooms"]).unwrap().command,
            CliCommand::Monitor {
                path: "rooms".to_string(),
                listen: false,
                events: vec![EventType::Put, EventType::Patch],
            }
        );

        assert_eq!(
            parse(&["monitor", "--listen", "--events", "put, keep-alive", "rooms"])
                .unwrap()
                .command,
            CliCommand::Monitor {
                path: "rooms".to_string(),
                listen: true,
                events: vec![EventType::Put, EventType::KeepAlive],
            }
        );
    }

    #[test]
    fn test_parse_rules() {
        assert_eq!(parse(&["rules", "get"]).unwrap().command, CliCommand::RulesGet);
        assert_eq!(parse(&["rules", "clear"]).unwrap().command, CliCommand::RulesClear);
        assert_eq!(
            parse(&["rules", "set", "rules.json"]).unwrap().command,
            CliCommand::RulesSet {
                file: PathBuf::from("rules.json")
            }
        );
        assert_eq!(
            parse(&["rules", "set"]),
            Err(ArgsError::MissingArgument("rules file"))
        );
        assert!(matches!(
            parse(&["rules", "drop"]),
            Err(ArgsError::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_parse_push_id() {
        assert_eq!(
            parse(&["push-id"]).unwrap().command,
            CliCommand::PushId { count: 1 }
        );
        assert_eq!(
            parse(&["push-id", "5"]).unwrap().command,
            CliCommand::PushId { count: 5 }
        );
        assert_eq!(
            parse(&["push-id", "many"]),
            Err(ArgsError::InvalidCount("many".to_string()))
        );
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            parse(&["--unknown"]),
            Err(ArgsError::UnknownOption("--unknown".to_string()))
        );
        assert_eq!(
            parse(&["merge"]),
            Err(ArgsError::UnknownCommand("merge".to_string()))
        );
        assert_eq!(
            parse(&["get", "a", "b"]),
            Err(ArgsError::UnexpectedArgument("b".to_string()))
        );
    }
}
