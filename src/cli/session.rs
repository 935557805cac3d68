//! Chat-style session handling.

use crate::ingest::{CouponSource, looks_like_coupon_code};
use crate::rendering::render_report;
use crate::services::{IngestOutcome, IngestService};
use crate::storage::SlipStore;
use crate::Result;
use std::io::{self, BufRead};
use tracing::{debug, warn};

/// Reply to `/start`.
pub const WELCOME: &str = "Hi there!\n\n\
Send me a slip as text, one match per line, or use /decode <code> to decode a coupon.\n\n\
Example: /decode DTWP3J7B";

/// Reply to `/help`.
pub const HELP: &str = "How to use:\n\
Send the slip as text, or use:\n\
/decode <code> - decode a coupon and show its matches\n\
/expiredays - show or set how many days matches stay active. Example: /expiredays 2\n\
/help - show this message";

const PARSE_FAILED: &str =
    "Could not understand the slip.\nWrite one match per line, like: Team A vs Team B";
const DECODE_USAGE: &str = "Add the code after the command. Example: /decode DTWP3J7B";
const DECODE_EMPTY: &str =
    "Could not find any matches for that code. The code may be wrong or the site blocked access.";
const EXPIRE_USAGE: &str = "Please enter a whole number. Example: /expiredays 2";

/// Handles one user's messages against an ingestion service.
pub struct Session<'a, S: SlipStore> {
    service: &'a IngestService<S>,
    coupons: &'a dyn CouponSource,
    user_id: i64,
}

impl<'a, S: SlipStore> Session<'a, S> {
    /// Creates a session for `user_id`.
    #[must_use]
    pub const fn new(
        service: &'a IngestService<S>,
        coupons: &'a dyn CouponSource,
        user_id: i64,
    ) -> Self {
        Self {
            service,
            coupons,
            user_id,
        }
    }

    /// Produces the reply to one message.
    ///
    /// Blank messages get no reply.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails while ingesting a slip. Bad
    /// user input is answered with a reply, not an error.
    pub fn handle(&self, message: &str) -> Result<Option<String>> {
        let message = message.trim();
        if message.is_empty() {
            return Ok(None);
        }

        if let Some(command) = message.strip_prefix('/') {
            let mut parts = command.split_whitespace();
            let name = parts.next().unwrap_or_default();
            let arg = parts.next();
            debug!(command = name, "Session command");
            return self.command(name, arg).map(Some);
        }

        if looks_like_coupon_code(message) {
            return self.decode(message).map(Some);
        }

        let outcome = self.service.ingest_text(self.user_id, message)?;
        Ok(Some(match outcome {
            IngestOutcome::Processed(report) => render_report(&report),
            IngestOutcome::NothingToProcess => PARSE_FAILED.to_string(),
        }))
    }

    fn command(&self, name: &str, arg: Option<&str>) -> Result<String> {
        match name.to_lowercase().as_str() {
            "start" => Ok(WELCOME.to_string()),
            "help" => Ok(HELP.to_string()),
            "expiredays" => Ok(self.expire_days(arg)),
            "decode" => arg.map_or_else(|| Ok(DECODE_USAGE.to_string()), |code| self.decode(code)),
            _ => Ok(format!("Unknown command /{name}. Send /help for usage.")),
        }
    }

    fn expire_days(&self, arg: Option<&str>) -> String {
        let expiry = self.service.expiry();
        let Some(arg) = arg else {
            return format!(
                "Current retention window: {} day(s).\nUse /expiredays 2 to change it.",
                expiry.retention_window()
            );
        };

        match arg.parse::<i64>() {
            Ok(days) => {
                expiry.set_retention_window(days);
                format!(
                    "Retention window set to {} day(s).",
                    expiry.retention_window()
                )
            },
            Err(_) => EXPIRE_USAGE.to_string(),
        }
    }

    fn decode(&self, code: &str) -> Result<String> {
        let code = code.trim();
        match self.service.ingest_coupon(self.user_id, code, self.coupons) {
            Ok(IngestOutcome::Processed(report)) => {
                Ok(format!("Decoded coupon {code}.\n{}", render_report(&report)))
            },
            Ok(IngestOutcome::NothingToProcess) => Ok(DECODE_EMPTY.to_string()),
            Err(e) if e.is_storage_unavailable() => Err(e),
            Err(e) => {
                warn!(code, error = %e, "Coupon decode failed");
                Ok(format!("Something went wrong while decoding the coupon: {e}"))
            },
        }
    }
}

/// Splits a stream into session messages.
///
/// A message is a run of non-blank lines ended by a blank line or end of
/// input. A line starting with `/` outside a message is a message on its
/// own, so commands answer immediately in interactive use.
pub struct MessageReader<R> {
    lines: io::Lines<R>,
}

impl<R: BufRead> MessageReader<R> {
    /// Wraps a buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

impl<R: BufRead> Iterator for MessageReader<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut buffer: Vec<String> = Vec::new();
        loop {
            match self.lines.next() {
                Some(Ok(line)) => {
                    if line.trim().is_empty() {
                        if buffer.is_empty() {
                            continue;
                        }
                        return Some(Ok(buffer.join("\n")));
                    }
                    if buffer.is_empty() && line.trim_start().starts_with('/') {
                        return Some(Ok(line));
                    }
                    buffer.push(line);
                },
                Some(Err(e)) => return Some(Err(e)),
                None => {
                    return (!buffer.is_empty()).then(|| Ok(buffer.join("\n")));
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchPair;
    use crate::storage::SqliteSlipStore;
    use crate::storage::testing::FailingStore;
    use std::sync::Arc;

    struct StubCoupons;

    impl CouponSource for StubCoupons {
        fn decode(&self, code: &str) -> Result<Vec<MatchPair>> {
            match code {
                "GOOD1" => Ok(vec![
                    MatchPair::new("Porto", "Benfica"),
                    MatchPair::new("Benfica", "Porto"),
                ]),
                "BROKEN" => Err(crate::Error::OperationFailed {
                    operation: "decode_coupon".to_string(),
                    cause: "boom".to_string(),
                }),
                _ => Ok(Vec::new()),
            }
        }
    }

    fn service() -> IngestService<SqliteSlipStore> {
        IngestService::new(Arc::new(SqliteSlipStore::in_memory().unwrap()), 2)
    }

    fn reply(session: &Session<'_, SqliteSlipStore>, message: &str) -> String {
        session.handle(message).unwrap().unwrap()
    }

    #[test]
    fn test_start_and_help() {
        let service = service();
        let session = Session::new(&service, &StubCoupons, 1);
        assert_eq!(reply(&session, "/start"), WELCOME);
        assert_eq!(reply(&session, "/help"), HELP);
        assert!(session.handle("   ").unwrap().is_none());
    }

    #[test]
    fn test_expiredays() {
        let service = service();
        let session = Session::new(&service, &StubCoupons, 1);

        assert!(reply(&session, "/expiredays").contains("2 day(s)"));
        assert_eq!(reply(&session, "/expiredays 5"), "Retention window set to 5 day(s).");
        assert_eq!(service.expiry().retention_window(), 5);
        assert_eq!(reply(&session, "/expiredays -3"), "Retention window set to 0 day(s).");
        assert_eq!(reply(&session, "/expiredays two"), EXPIRE_USAGE);
        assert_eq!(service.expiry().retention_window(), 0);
    }

    #[test]
    fn test_slip_message() {
        let service = service();
        let session = Session::new(&service, &StubCoupons, 1);

        let first = reply(&session, "Arsenal vs Chelsea\nChelsea - Arsenal");
        assert!(first.starts_with("This slip contains duplicated matches."));

        let second = reply(&session, "Arsenal vs Chelsea\nChelsea - Arsenal");
        assert!(second.starts_with("This exact slip was submitted before."));
    }

    #[test]
    fn test_unparseable_message() {
        let service = service();
        let session = Session::new(&service, &StubCoupons, 1);
        assert_eq!(reply(&session, "hello there friend"), PARSE_FAILED);
    }

    #[test]
    fn test_decode_paths() {
        let service = service();
        let session = Session::new(&service, &StubCoupons, 1);

        assert_eq!(reply(&session, "/decode"), DECODE_USAGE);
        assert_eq!(reply(&session, "/decode NOTHING"), DECODE_EMPTY);
        assert!(reply(&session, "/decode BROKEN").contains("boom"));

        let decoded = reply(&session, "GOOD1");
        assert!(decoded.starts_with("Decoded coupon GOOD1."));
        assert!(decoded.contains("This slip contains duplicated matches."));
    }

    #[test]
    fn test_unknown_command() {
        let service = service();
        let session = Session::new(&service, &StubCoupons, 1);
        assert!(reply(&session, "/frobnicate").starts_with("Unknown command /frobnicate"));
    }

    #[test]
    fn test_storage_failure_ends_session_turn_with_error() {
        let service = IngestService::new(Arc::new(FailingStore::new("save_submission").unwrap()), 2);
        let session = Session::new(&service, &StubCoupons, 1);

        let err = session.handle("A vs B").unwrap_err();
        assert!(err.is_storage_unavailable());
        let err = session.handle("/decode GOOD1").unwrap_err();
        assert!(err.is_storage_unavailable());
        // Commands that never touch the store still answer
        assert_eq!(session.handle("/help").unwrap().as_deref(), Some(HELP));
    }

    #[test]
    fn test_message_reader() {
        let input = "/help\nA vs B\nC vs D\n\n\n/expiredays 3\nE vs F";
        let messages: Vec<String> = MessageReader::new(input.as_bytes())
            .collect::<io::Result<_>>()
            .unwrap();

        assert_eq!(
            messages,
            vec!["/help", "A vs B\nC vs D", "/expiredays 3", "E vs F"]
        );
    }

    #[test]
    fn test_message_reader_slash_inside_message() {
        let input = "A vs B\n/ not a command\n";
        let messages: Vec<String> = MessageReader::new(input.as_bytes())
            .collect::<io::Result<_>>()
            .unwrap();
        assert_eq!(messages, vec!["A vs B\n/ not a command"]);
    }
}
