//! Free-text slip parser.

use crate::models::MatchPair;
use regex::Regex;
use std::sync::LazyLock;

/// Longest message that is still treated as a coupon code.
pub const MAX_COUPON_CODE_LEN: usize = 12;

/// Team separators, tried in order. The first one that splits a line into
/// two non-empty sides wins.
static DELIMITERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\s+vs\s+",
        r"(?i)\s+v\s+",
        r"\s*-\s*",
        r"\s*—\s*",
        r"\s*\|\s*",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Extracts match pairs from a pasted slip, one pair per line.
///
/// Blank lines and lines without a recognisable separator are skipped. Team
/// names are trimmed but otherwise kept as written.
///
/// # Example
///
/// ```rust
/// use slipcheck::ingest::parse_bet_slip;
///
/// let pairs = parse_bet_slip("Arsenal vs Chelsea\n\nnot a match\nLazio - Roma");
/// assert_eq!(pairs.len(), 2);
/// assert_eq!(pairs[1].team_b, "Roma");
/// ```
#[must_use]
pub fn parse_bet_slip(text: &str) -> Vec<MatchPair> {
    text.lines().filter_map(parse_line).collect()
}

/// Parses a single line into a pair.
///
/// Falls back to a comma split when no separator matches; that split must
/// yield exactly two non-empty parts.
#[must_use]
pub fn parse_line(line: &str) -> Option<MatchPair> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    for delimiter in DELIMITERS.iter() {
        let mut sides = delimiter.splitn(line, 2);
        if let (Some(a), Some(b)) = (sides.next(), sides.next()) {
            let (a, b) = (a.trim(), b.trim());
            if !a.is_empty() && !b.is_empty() {
                return Some(MatchPair::new(a, b));
            }
        }
    }

    let parts: Vec<&str> = line
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();
    match parts.as_slice() {
        [a, b] => Some(MatchPair::new(*a, *b)),
        _ => None,
    }
}

/// Returns `true` if the message looks like a coupon code rather than a slip.
#[must_use]
pub fn looks_like_coupon_code(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty()
        && text.chars().count() <= MAX_COUPON_CODE_LEN
        && text.chars().all(char::is_alphanumeric)
}
