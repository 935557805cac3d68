//! Command handlers module.
//!
//! - `core.rs`: one-shot commands (submit, decode, sweep, status, expire-days)
//! - `session.rs`: the interactive session loop

mod core;
mod session;

pub use self::core::{cmd_decode, cmd_expire_days, cmd_status, cmd_submit, cmd_sweep};
pub use session::cmd_session;

use std::sync::Arc;

use slipcheck::config::SlipcheckConfig;
use slipcheck::{IngestService, SqliteSlipStore};

/// Opens the configured store.
pub fn open_store(config: &SlipcheckConfig) -> slipcheck::Result<Arc<SqliteSlipStore>> {
    SqliteSlipStore::new(&config.db_path).map(Arc::new)
}

/// Builds an ingestion service over the configured store.
pub fn build_service(
    config: &SlipcheckConfig,
) -> slipcheck::Result<IngestService<SqliteSlipStore>> {
    Ok(IngestService::new(open_store(config)?, config.retention_days))
}
