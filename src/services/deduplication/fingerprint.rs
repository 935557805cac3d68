//! Slip fingerprinting.
//!
//! A fingerprint identifies an exact ordered sequence of normalized pairs.
//! Reordering the same matches yields a different fingerprint.

use crate::models::{NormalizedPair, SlipFingerprint};
use sha2::{Digest, Sha256};

/// Terminator appended to every pair before hashing.
const LINE_TERMINATOR: &[u8] = b"\n";

/// Computes [`SlipFingerprint`]s.
///
/// # Example
///
/// ```rust
/// use slipcheck::services::{PairNormalizer, SlipFingerprinter};
///
/// let pairs = vec![
///     PairNormalizer::normalize("Arsenal", "Chelsea"),
///     PairNormalizer::normalize("Lazio", "Roma"),
/// ];
/// let fp = SlipFingerprinter::fingerprint(&pairs);
/// assert_eq!(fp.as_str().len(), 64); // SHA256 produces 64 hex chars
/// ```
pub struct SlipFingerprinter;

impl SlipFingerprinter {
    /// Hashes the ordered pairs with SHA-256 and returns the lowercase hex digest.
    #[must_use]
    pub fn fingerprint(pairs: &[NormalizedPair]) -> SlipFingerprint {
        let mut hasher = Sha256::new();
        for pair in pairs {
            hasher.update(pair.as_str().as_bytes());
            hasher.update(LINE_TERMINATOR);
        }
        SlipFingerprint::from_hex(hex::encode(hasher.finalize()))
    }
}
