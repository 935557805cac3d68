//! Interactive session loop.

use std::io::{self, Write};

use slipcheck::cli::{MessageReader, Session, WELCOME};
use slipcheck::config::SlipcheckConfig;
use slipcheck::ingest::CouponDecoder;

use super::build_service;

/// Session command.
///
/// Reads messages from stdin (separated by blank lines) and answers each.
/// Storage errors are reported and the session continues.
pub fn cmd_session(
    config: &SlipcheckConfig,
    user: Option<i64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = build_service(config)?;
    let decoder = CouponDecoder::new(&config.coupon)?;
    let session = Session::new(&service, &decoder, user.unwrap_or(config.default_user_id));

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{WELCOME}\n")?;
    stdout.flush()?;

    for message in MessageReader::new(io::stdin().lock()) {
        match session.handle(&message?) {
            Ok(Some(reply)) => writeln!(stdout, "{reply}\n")?,
            Ok(None) => {},
            Err(e) => eprintln!("Error: {e}"),
        }
        stdout.flush()?;
    }

    Ok(())
}
