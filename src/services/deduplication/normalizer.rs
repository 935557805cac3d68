//! Pair normalization.
//!
//! Reduces a `(team A, team B)` pair to a key that ignores team order, letter
//! case and spacing, so `"Real Madrid vs Barcelona"` and
//! `"  barcelona   v REAL MADRID"` count as the same match.

use crate::models::{MatchPair, NormalizedPair};

/// Separator placed between the two sorted team names.
pub const PAIR_SEPARATOR: &str = " | ";

/// Canonicalizes match pairs.
///
/// # Normalization
///
/// Each team name is:
/// - Trimmed of leading/trailing whitespace
/// - Collapsed so internal whitespace runs become single spaces
/// - Converted to lowercase
///
/// The two names are then sorted and joined with [`PAIR_SEPARATOR`].
///
/// # Example
///
/// ```rust
/// use slipcheck::services::PairNormalizer;
///
/// let a = PairNormalizer::normalize("Real Madrid", "Barcelona");
/// let b = PairNormalizer::normalize("  barcelona ", "REAL   madrid");
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "barcelona | real madrid");
/// ```
pub struct PairNormalizer;

impl PairNormalizer {
    /// Normalizes a pair of team names into a [`NormalizedPair`].
    ///
    /// Empty names are accepted and kept as empty strings.
    #[must_use]
    pub fn normalize(team_a: &str, team_b: &str) -> NormalizedPair {
        let a = Self::normalize_name(team_a);
        let b = Self::normalize_name(team_b);
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        NormalizedPair::from_key(format!("{first}{PAIR_SEPARATOR}{second}"))
    }

    /// Normalizes a [`MatchPair`].
    #[must_use]
    pub fn normalize_pair(pair: &MatchPair) -> NormalizedPair {
        Self::normalize(&pair.team_a, &pair.team_b)
    }

    /// Normalizes a single team name.
    ///
    /// ```rust
    /// use slipcheck::services::PairNormalizer;
    ///
    /// assert_eq!(PairNormalizer::normalize_name("  Man   UTD "), "man utd");
    /// ```
    #[must_use]
    pub fn normalize_name(name: &str) -> String {
        name.split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_independent() {
        assert_eq!(
            PairNormalizer::normalize("Arsenal", "Chelsea"),
            PairNormalizer::normalize("Chelsea", "Arsenal")
        );
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        let a = PairNormalizer::normalize("Real Madrid", "Getafe");
        let b = PairNormalizer::normalize("  real   madrid ", "GETAFE");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "getafe | real madrid");
    }

    #[test]
    fn test_tabs_and_newlines_collapse() {
        assert_eq!(PairNormalizer::normalize_name("Inter\tMilan"), "inter milan");
        assert_eq!(PairNormalizer::normalize_name("Inter\n Milan"), "inter milan");
    }

    #[test]
    fn test_empty_names_accepted() {
        assert_eq!(PairNormalizer::normalize("", "").as_str(), " | ");
        assert_eq!(PairNormalizer::normalize("Ajax", "   ").as_str(), " | ajax");
    }

    #[test]
    fn test_idempotent_on_normalized_names() {
        let once = PairNormalizer::normalize_name("  PSV   Eindhoven ");
        assert_eq!(PairNormalizer::normalize_name(&once), once);
    }

    #[test]
    fn test_unicode_names() {
        let a = PairNormalizer::normalize("الأهلي", "الزمالك");
        let b = PairNormalizer::normalize(" الزمالك ", "الأهلي");
        assert_eq!(a, b);

        assert_eq!(PairNormalizer::normalize_name("BAYERN MÜNCHEN"), "bayern münchen");
    }

    #[test]
    fn test_normalize_pair_matches_normalize() {
        let pair = MatchPair::new("Lyon", "Nice");
        assert_eq!(
            PairNormalizer::normalize_pair(&pair),
            PairNormalizer::normalize("Lyon", "Nice")
        );
    }
}
