use dorisload_client::{ClientError, LoadResponse};
use log::{debug, error, warn};

use crate::retry::RetryNotice;

/// Describes the batch a worker is committing.
#[derive(Debug, Clone, Copy)]
pub struct CommitInfo<'a> {
    /// Index of the worker in the pool.
    pub worker: usize,
    pub records: usize,
    /// Estimated payload size, separators excluded.
    pub bytes: usize,
    pub label: Option<&'a str>,
}

/// Observes commit outcomes.
///
/// Workers run without a caller waiting on them, so this is where
/// failures of threshold, periodic and shutdown commits surface.
/// Every method logs by default.
pub trait CommitListener: Send + Sync {
    /// The batch was loaded.
    fn on_commit(&self, info: &CommitInfo<'_>, response: &LoadResponse) {
        debug!(
            "worker {} committed {} records ({} bytes): txn={} loaded={} filtered={}",
            info.worker,
            info.records,
            info.bytes,
            response.txn_id,
            response.number_loaded_rows,
            response.number_filtered_rows,
        );
    }

    /// An attempt failed and another one follows after `notice.next_delay`.
    fn on_retry(&self, info: &CommitInfo<'_>, error: &ClientError, notice: RetryNotice) {
        warn!(
            "worker {} commit attempt {} failed, retrying in {:?}: {error}",
            info.worker,
            notice.attempt,
            notice.next_delay.unwrap_or_default(),
        );
    }

    /// The batch was dropped after `attempts` failed attempts.
    fn on_failure(&self, info: &CommitInfo<'_>, error: &ClientError, attempts: u32) {
        error!(
            "worker {} dropped {} records after {} attempts (label {:?}): {error}",
            info.worker, info.records, attempts, info.label,
        );
    }
}

/// Listener that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogListener;

impl CommitListener for LogListener {}
