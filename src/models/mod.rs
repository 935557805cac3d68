//! Data models for slips, matches and classification results.

mod report;
mod slip;

pub use report::{ClassifiedRow, SlipFlags, SlipReport};
pub use slip::{MatchPair, MatchRecord, NormalizedPair, Slip, SlipFingerprint, SlipId};
