//! appsettings — command-line access to a settings file.
//!
//! # Usage
//!
//! ```text
//! appsettings set server.port 8080 server."display name" "Main box"
//! appsettings get server.port
//! appsettings incr stats.launches
//! appsettings delete server.port
//! appsettings delete-tree server
//! appsettings --file other.json --pretty list server
//! ```

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use appsettings_core::{execute, Command, FileStorage, Settings, SettingsOptions};
use clap::{Parser, Subcommand};
use tracing::debug;

const FILE_ENV: &str = "APPSETTINGS_FILE";
const DEFAULT_FILE: &str = "appsettings.json";


#[derive(Parser, Debug)]
#[command(name = "appsettings")]
#[command(about = "Query and edit a hierarchical settings file", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file to operate on [env: APPSETTINGS_FILE] [default: appsettings.json]
    #[arg(short, long, global = true)]
    file: Option<PathBuf>,

    /// Write the file indented for humans
    #[arg(long, global = true)]
    pretty: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print key values to stdout
    Get {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Set key values: <key> <value> [<key> <value>...]
    Set {
        #[arg(required = true)]
        args: Vec<String>,
    },
    /// Delete keys
    Delete { keys: Vec<String> },
    /// Delete branches and everything beneath them
    DeleteTree { keys: Vec<String> },
    /// Increment integer keys and print the new values
    Incr {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Decrement integer keys and print the new values
    Decr {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// List the leaves and branches under a path (default: the root)
    List { path: Option<String> },
}

impl Commands {
    fn into_command(self) -> appsettings_core::Result<Command> {
        Ok(match self {
            Commands::Get { keys } => Command::Get { keys },
            Commands::Set { args } => Command::set_from_args(&args)?,
            Commands::Delete { keys } => Command::Delete { keys },
            Commands::DeleteTree { keys } => Command::DeleteTree { keys },
            Commands::Incr { keys } => Command::Incr { keys },
            Commands::Decr { keys } => Command::Decr { keys },
            Commands::List { path } => Command::List { path },
        })
    }
}


fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("appsettings: {:#}", e);
            process::exit(1);
        }
    }
}


fn run(cli: Cli) -> Result<String> {
    let file = resolve_settings_file(cli.file);
    let cmd = cli.command.into_command()?;
    debug!(file = %file.display(), ?cmd, "running command");

    let options = SettingsOptions::new()
        .storage(Arc::new(FileStorage::new(file.clone())))
        .pretty(cli.pretty);
    let settings = Settings::open(file.to_string_lossy(), options)
        .with_context(|| format!("failed to open {}", file.display()))?;

    Ok(execute(&settings, &cmd)?)
}


/// `--file` wins, then `APPSETTINGS_FILE`, then `appsettings.json`.
fn resolve_settings_file(flag: Option<PathBuf>) -> PathBuf {
    if let Some(path) = flag {
        return path;
    }
    match std::env::var_os(FILE_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => PathBuf::from(DEFAULT_FILE),
    }
}


/// Log to stderr so command output on stdout stays clean. `RUST_LOG`
/// overrides the level picked by `--verbose`.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
