//! Storage backend traits.

mod slip_store;

pub use slip_store::{SlipStore, StoreStats};
