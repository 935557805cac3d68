//! One-shot command handlers.

use std::io::Read;
use std::path::PathBuf;

use chrono::Utc;
use slipcheck::config::SlipcheckConfig;
use slipcheck::gc::{ExpiryManager, RetentionWindow, parse_retention_days};
use slipcheck::ingest::CouponDecoder;
use slipcheck::rendering::{OutputFormat, render_json, render_report};
use slipcheck::storage::SlipStore;
use slipcheck::IngestOutcome;
use std::sync::Arc;

use super::{build_service, open_store};

const NOTHING_PARSED: &str =
    "Could not understand the slip.\nWrite one match per line, like: Team A vs Team B";
const NOTHING_DECODED: &str =
    "Could not find any matches for that code. The code may be wrong or the site blocked access.";

/// Submit command.
///
/// Reads the slip from `text`, else `file`, else stdin.
pub fn cmd_submit(
    config: &SlipcheckConfig,
    text: Option<String>,
    file: Option<PathBuf>,
    user: Option<i64>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let format = OutputFormat::parse(format)?;
    let input = match (text, file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?,
        (None, None) => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        },
    };

    let service = build_service(config)?;
    let outcome = service.ingest_text(user.unwrap_or(config.default_user_id), &input)?;
    print_outcome(&outcome, format, NOTHING_PARSED)
}

/// Decode command.
pub fn cmd_decode(
    config: &SlipcheckConfig,
    code: &str,
    user: Option<i64>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let format = OutputFormat::parse(format)?;
    let decoder = CouponDecoder::new(&config.coupon)?;
    let service = build_service(config)?;

    let outcome =
        service.ingest_coupon(user.unwrap_or(config.default_user_id), code, &decoder)?;
    print_outcome(&outcome, format, NOTHING_DECODED)
}

/// Sweep command.
pub fn cmd_sweep(config: &SlipcheckConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.retention_days == 0 {
        println!("Expiry is disabled (retention window is 0 days).");
        return Ok(());
    }

    let manager = ExpiryManager::new(
        open_store(config)?,
        Arc::new(RetentionWindow::new(config.retention_days)),
    );
    let deactivated = manager.sweep_expired(Utc::now())?;
    println!(
        "Deactivated {deactivated} match(es) older than {} day(s).",
        config.retention_days
    );
    Ok(())
}

/// Status command.
pub fn cmd_status(config: &SlipcheckConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(config)?;
    let stats = store.stats()?;

    println!("Slipcheck Status");
    println!("================");
    println!();
    println!("Database:         {}", config.db_path.display());
    println!("Retention window: {} day(s)", config.retention_days);
    println!();
    println!("Slips:            {}", stats.slips);
    println!("Matches:          {}", stats.matches);
    println!("Active matches:   {}", stats.active_matches);
    Ok(())
}

/// Expire-days command.
///
/// Without a value, shows the effective window. With a value, validates it
/// and shows how it would be applied; the window itself lives in config.
pub fn cmd_expire_days(
    config: &SlipcheckConfig,
    days: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    match days {
        None => println!("Current retention window: {} day(s).", config.retention_days),
        Some(value) => {
            let days = parse_retention_days(value)?;
            println!("Retention window of {days} day(s) is valid.");
            println!(
                "Persist it with retention_days = {days} in the config file or SLIPCHECK_EXPIRE_DAYS={days}."
            );
        },
    }
    Ok(())
}

fn print_outcome(
    outcome: &IngestOutcome,
    format: OutputFormat,
    nothing_message: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    match (outcome, format) {
        (IngestOutcome::Processed(report), OutputFormat::Text) => {
            println!("{}", render_report(report));
        },
        (IngestOutcome::Processed(report), OutputFormat::Json) => {
            println!("{}", render_json(report)?);
        },
        (IngestOutcome::NothingToProcess, OutputFormat::Text) => println!("{nothing_message}"),
        (IngestOutcome::NothingToProcess, OutputFormat::Json) => {
            println!("{}", serde_json::json!({ "status": "nothing_to_process" }));
        },
    }
    Ok(())
}
