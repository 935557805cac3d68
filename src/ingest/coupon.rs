//! Coupon code decoding over HTTP.
//!
//! Bookmakers publish shared coupons as HTML pages. The decoder fetches the
//! page for a code from a list of URL templates and scrapes match pairs out
//! of its text. Every failure mode (transport errors, non-200 responses,
//! pages without pairs) moves on to the next template; a code that resolves
//! nowhere yields an empty list.

use crate::config::CouponConfig;
use crate::models::MatchPair;
use crate::{Error, Result};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

use super::parser::parse_line;

/// Placeholder replaced by the coupon code in URL templates.
const CODE_PLACEHOLDER: &str = "{code}";

/// Team names outside this length range are page noise, not teams.
const TEAM_NAME_CHARS: std::ops::RangeInclusive<usize> = 2..=60;

/// Coupon page locations tried when no templates are configured.
pub const DEFAULT_COUPON_URLS: &[&str] = &[
    "https://1xbet.com/en/line/mobileCoupon/{code}",
    "https://1xbet.com/en/line/coupon/{code}",
    "https://1xbet.com/coupon/{code}",
    "https://1xbet.com/ru/line/coupon/{code}",
    "https://www.1xbet.com/en/line/coupon/{code}",
];

static SCRIPT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b.*?</script\s*>").unwrap_or_else(|_| unreachable!())
});

static STYLE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<style\b.*?</style\s*>").unwrap_or_else(|_| unreachable!())
});

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap_or_else(|_| unreachable!()));

/// Resolves a coupon code to the match pairs it contains.
pub trait CouponSource: Send + Sync {
    /// Decodes `code` into match pairs.
    ///
    /// An unknown code is not an error; it yields an empty list.
    ///
    /// # Errors
    ///
    /// Implementations return an error only when decoding cannot be
    /// attempted at all.
    fn decode(&self, code: &str) -> Result<Vec<MatchPair>>;
}

/// HTTP coupon decoder backed by a blocking `reqwest` client.
pub struct CouponDecoder {
    client: reqwest::blocking::Client,
    url_templates: Vec<String>,
}

impl CouponDecoder {
    /// Builds a decoder from coupon settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if the HTTP client cannot be built.
    pub fn new(config: &CouponConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::OperationFailed {
                operation: "build_http_client".to_string(),
                cause: e.to_string(),
            })?;

        let url_templates = if config.urls.is_empty() {
            DEFAULT_COUPON_URLS.iter().map(ToString::to_string).collect()
        } else {
            config.urls.clone()
        };

        Ok(Self {
            client,
            url_templates,
        })
    }

    /// Returns the URL templates tried, in order.
    #[must_use]
    pub fn url_templates(&self) -> &[String] {
        &self.url_templates
    }

    fn fetch(&self, url: &str) -> Option<String> {
        let response = match self.client.get(url).send() {
            Ok(response) => response,
            Err(e) => {
                warn!(url, error = %e, "Coupon request failed");
                return None;
            },
        };

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            debug!(url, status = status.as_u16(), "Coupon page not available");
            return None;
        }

        response
            .text()
            .map_err(|e| warn!(url, error = %e, "Coupon body unreadable"))
            .ok()
    }
}

impl CouponSource for CouponDecoder {
    #[instrument(name = "slipcheck.decode_coupon", skip(self), fields(pairs))]
    fn decode(&self, code: &str) -> Result<Vec<MatchPair>> {
        let code = code.trim();
        if code.is_empty() {
            return Ok(Vec::new());
        }

        let start = Instant::now();
        for template in &self.url_templates {
            let url = template.replace(CODE_PLACEHOLDER, code);
            let Some(page) = self.fetch(&url) else {
                continue;
            };

            let pairs = extract_pairs_from_page(&page);
            if !pairs.is_empty() {
                tracing::Span::current().record("pairs", pairs.len());
                metrics::counter!("coupon_decodes_total", "status" => "found").increment(1);
                metrics::histogram!("coupon_decode_duration_ms")
                    .record(start.elapsed().as_secs_f64() * 1000.0);
                return Ok(pairs);
            }
        }

        metrics::counter!("coupon_decodes_total", "status" => "not_found").increment(1);
        Ok(Vec::new())
    }
}

/// Scrapes match pairs out of an HTML (or plain text) coupon page.
///
/// Scripts, styles and tags are removed, then each remaining line is parsed
/// like a slip line. Pairs repeated on the page (compared case-insensitively)
/// are kept once, in first-seen order.
#[must_use]
pub fn extract_pairs_from_page(page: &str) -> Vec<MatchPair> {
    let without_scripts = SCRIPT_BLOCK.replace_all(page, "\n");
    let without_styles = STYLE_BLOCK.replace_all(&without_scripts, "\n");
    let text = TAG.replace_all(&without_styles, "\n");

    let mut seen = HashSet::new();
    text.lines()
        .map(decode_entities)
        .filter_map(|line| parse_line(&line))
        .filter(|pair| {
            TEAM_NAME_CHARS.contains(&pair.team_a.chars().count())
                && TEAM_NAME_CHARS.contains(&pair.team_b.chars().count())
        })
        .filter(|pair| seen.insert((pair.team_a.to_lowercase(), pair.team_b.to_lowercase())))
        .collect()
}

fn decode_entities(line: &str) -> String {
    line.replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
