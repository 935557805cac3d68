//! Business logic services.
//!
//! Services orchestrate the slip store and provide high-level operations.

pub mod deduplication;
mod ingest;

pub use deduplication::{
    Classification, DuplicateClassifier, PAIR_SEPARATOR, PairNormalizer, SlipFingerprinter,
};
pub use ingest::{IngestOutcome, IngestService};
