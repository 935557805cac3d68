//! Binary entry point for slipcheck.
//!
//! This binary provides the CLI interface for checking bet slips.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use commands::{cmd_decode, cmd_expire_days, cmd_session, cmd_status, cmd_submit, cmd_sweep};
use slipcheck::config::SlipcheckConfig;
use slipcheck::gc::parse_retention_days;
use slipcheck::observability::{self, ObservabilityConfig};

/// Slipcheck - duplicate detection for bet slips.
#[derive(Parser)]
#[command(name = "slipcheck")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the `SQLite` database.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Days a match stays active (0 disables expiry, negatives clamp to 0).
    #[arg(long, global = true, allow_hyphen_values = true)]
    expire_days: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Check and record a slip.
    Submit {
        /// Slip text, one match per line.
        #[arg(conflicts_with = "file")]
        text: Option<String>,

        /// Read the slip from a file.
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Submitting user id.
        #[arg(short, long)]
        user: Option<i64>,

        /// Output format: text or json.
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Decode a coupon code, then check and record its matches.
    Decode {
        /// The coupon code.
        code: String,

        /// Submitting user id.
        #[arg(short, long)]
        user: Option<i64>,

        /// Output format: text or json.
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Deactivate matches older than the retention window.
    Sweep,

    /// Show store statistics.
    Status,

    /// Show or validate the retention window.
    ExpireDays {
        /// New window in days.
        #[arg(allow_hyphen_values = true)]
        days: Option<String>,
    },

    /// Answer slips and commands interactively from stdin.
    Session {
        /// Submitting user id.
        #[arg(short, long)]
        user: Option<i64>,
    },
}

/// Main entry point.
fn main() -> ExitCode {
    // A missing .env file is normal
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    if let Err(e) = observability::init(&ObservabilityConfig::from_config(&config, cli.verbose)) {
        eprintln!("Failed to initialize observability: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(cli: Cli, config: &SlipcheckConfig) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Submit {
            text,
            file,
            user,
            format,
        } => cmd_submit(config, text, file, user, &format),

        Commands::Decode { code, user, format } => cmd_decode(config, &code, user, &format),

        Commands::Sweep => cmd_sweep(config),

        Commands::Status => cmd_status(config),

        Commands::ExpireDays { days } => cmd_expire_days(config, days.as_deref()),

        Commands::Session { user } => cmd_session(config, user),
    }
}

/// Loads configuration, then applies command-line overrides.
fn load_config(cli: &Cli) -> slipcheck::Result<SlipcheckConfig> {
    let mut config = SlipcheckConfig::load(cli.config.as_deref())?;

    if let Some(db) = &cli.db {
        config = config.with_db_path(db);
    }
    if let Some(days) = &cli.expire_days {
        config = config.with_retention_days(parse_retention_days(days)?);
    }

    Ok(config)
}
