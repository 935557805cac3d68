//! Match deduplication.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    DuplicateClassifier                       │
//! │  ┌────────────────┐  ┌──────────────────┐  ┌──────────────┐  │
//! │  │ PairNormalizer │  │ SlipFingerprinter│  │  SlipStore   │  │
//! │  │                │  │                  │  │              │  │
//! │  │ order/case/    │  │ SHA256 over      │  │ active-match │  │
//! │  │ space-free key │  │ ordered keys     │  │ + slip lookup│  │
//! │  └────────────────┘  └──────────────────┘  └──────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod classifier;
mod fingerprint;
mod normalizer;

pub use classifier::{Classification, DuplicateClassifier};
pub use fingerprint::SlipFingerprinter;
pub use normalizer::{PAIR_SEPARATOR, PairNormalizer};
