//! ==============================================================================
//! lib.rs - huinan history merge
//! ==============================================================================
//!
//! purpose:
//!     merges the huinan (回南天) reading published by the remote collector
//!     node into the local history document. one run is one idempotent step:
//!
//! ```text
//!         load local history -> fetch remote snapshot -> reconcile -> save
//!
//!     only the save can fail a run. a missing store starts empty, a failed
//!     fetch merges nothing, a bad timestamp skips the retention trim.
//! ```
//!
//! relationships:
//!     - config.rs: merge.toml schema
//!     - store.rs: history document load/save
//!     - fetch.rs: remote snapshot GET
//!     - reconcile.rs: the merge itself
//!     - timestamp.rs: record time formatting/parsing
//!
//! ==============================================================================

pub mod config;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod reconcile;
pub mod store;
pub mod timestamp;

use config::MergeConfig;
use error::PersistError;
use fetch::SnapshotFetcher;
use reconcile::{MergeReport, Reconciler};
use store::HistoryStore;

use time::{OffsetDateTime, UtcOffset};
use tracing::{info, warn};

/// Run one merge step against the configured store and source.
///
/// `local_offset` is the machine's UTC offset; record times are local wall-clock.
pub async fn run(config: &MergeConfig, local_offset: UtcOffset) -> Result<MergeReport, PersistError> {
    let store = HistoryStore::new(&config.storage.path);
    let local = store.load();
    info!(
        path = %store.path().display(),
        records = local.records.len(),
        "local history"
    );

    let remote = match SnapshotFetcher::new(&config.source.url, config.fetch_timeout()) {
        Ok(fetcher) => {
            info!(url = fetcher.url(), "fetching remote snapshot");
            fetcher.fetch().await
        }
        Err(e) => {
            warn!("{}", e);
            None
        }
    };

    let reconciler = Reconciler::new(config.retention_window(), &config.source.tag);
    let now = OffsetDateTime::now_utc().to_offset(local_offset);
    let (merged, report) = reconciler.reconcile_with_report(local, remote, now);

    store.save(&merged)?;
    Ok(report)
}
