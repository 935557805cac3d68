//! Turning user input into match pairs.
//!
//! Free text goes through [`parse_bet_slip`]; short alphanumeric messages are
//! treated as bookmaker coupon codes and resolved by a [`CouponSource`].

mod coupon;
mod parser;

pub use coupon::{CouponDecoder, CouponSource, DEFAULT_COUPON_URLS, extract_pairs_from_page};
pub use parser::{MAX_COUPON_CODE_LEN, looks_like_coupon_code, parse_bet_slip, parse_line};
