//! CLI module for the `firebase` binary.
//!
//! This module provides command-line interface functionality including:
//! - Argument parsing
//! - Building a database reference from flags and environment
//! - The command implementations
//!
//! # Usage
//!
//! ```ignore
//! use firebase_rtdb::cli::{parse_args, run_cli_command};
//!
//! let args = parse_args(std::env::args())?;
//! run_cli_command(args, cancel).await?;
//! ```

pub mod args;
pub mod commands;

pub use args::{parse_args, ArgsError, CliArgs, CliCommand, GlobalOptions, USAGE};

use color_eyre::Result;
use tokio_util::sync::CancellationToken;

use crate::config::DatabaseConfig;
use crate::database::DatabaseRef;

/// The current version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Database configuration from the environment, overridden by flags.
pub fn database_config(global: &GlobalOptions) -> Result<DatabaseConfig> {
    let mut config = DatabaseConfig::from_env()?;
    if let Some(path) = &global.credentials {
        config = config.with_credentials_file(path)?;
    }
    if let Some(url) = &global.url {
        config = config.with_url(url.clone());
    }
    Ok(config)
}

/// Run a parsed command. `cancel` stops long-running commands.
pub async fn run_cli_command(args: CliArgs, cancel: CancellationToken) -> Result<()> {
    let db = match args.command {
        CliCommand::Version => {
            println!("firebase {}", VERSION);
            return Ok(());
        }
        CliCommand::Help => {
            println!("{}", USAGE);
            return Ok(());
        }
        CliCommand::PushId { count } => {
            for id in commands::push_ids(count) {
                println!("{}", id);
            }
            return Ok(());
        }
        _ => DatabaseRef::new(database_config(&args.global)?)?,
    };

    match args.command {
        CliCommand::Get { path, shallow } => commands::get(&db, &path, shallow).await,
        CliCommand::Monitor {
            path,
            listen,
            events,
        } => commands::monitor(&db, &path, listen, events, cancel).await,
        CliCommand::RulesGet => commands::rules_get(&db).await,
        CliCommand::RulesSet { file } => commands::rules_set(&db, &file).await,
        CliCommand::RulesClear => commands::rules_clear(&db).await,
        CliCommand::Version | CliCommand::Help | CliCommand::PushId { .. } => Ok(()),
    }
}
