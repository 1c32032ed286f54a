use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use dorisload_bulk::{
    ClientError, CommitInfo, CommitListener, LoadResponse, LogListener, RetryNotice,
};

/// Counts commit outcomes for the end-of-run summary, logging like
/// [`LogListener`].
#[derive(Debug, Default)]
pub struct SummaryListener {
    commits: AtomicU64,
    loaded_rows: AtomicU64,
    filtered_rows: AtomicU64,
    loaded_bytes: AtomicU64,
    retries: AtomicU64,
    failed_commits: AtomicU64,
    dropped_records: AtomicU64,
}

impl SummaryListener {
    pub fn snapshot(&self) -> Summary {
        Summary {
            commits: self.commits.load(Ordering::Relaxed),
            loaded_rows: self.loaded_rows.load(Ordering::Relaxed),
            filtered_rows: self.filtered_rows.load(Ordering::Relaxed),
            loaded_bytes: self.loaded_bytes.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            failed_commits: self.failed_commits.load(Ordering::Relaxed),
            dropped_records: self.dropped_records.load(Ordering::Relaxed),
        }
    }
}

impl CommitListener for SummaryListener {
    fn on_commit(&self, info: &CommitInfo<'_>, response: &LoadResponse) {
        self.commits.fetch_add(1, Ordering::Relaxed);
        self.loaded_rows
            .fetch_add(response.number_loaded_rows, Ordering::Relaxed);
        self.filtered_rows
            .fetch_add(response.number_filtered_rows, Ordering::Relaxed);
        self.loaded_bytes.fetch_add(info.bytes as u64, Ordering::Relaxed);
        LogListener.on_commit(info, response);
    }

    fn on_retry(&self, info: &CommitInfo<'_>, error: &ClientError, notice: RetryNotice) {
        self.retries.fetch_add(1, Ordering::Relaxed);
        LogListener.on_retry(info, error, notice);
    }

    fn on_failure(&self, info: &CommitInfo<'_>, error: &ClientError, attempts: u32) {
        self.failed_commits.fetch_add(1, Ordering::Relaxed);
        self.dropped_records
            .fetch_add(info.records as u64, Ordering::Relaxed);
        LogListener.on_failure(info, error, attempts);
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub commits: u64,
    pub loaded_rows: u64,
    pub filtered_rows: u64,
    pub loaded_bytes: u64,
    pub retries: u64,
    pub failed_commits: u64,
    pub dropped_records: u64,
}

impl Summary {
    pub fn is_clean(&self) -> bool {
        self.failed_commits == 0
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[load] commits:  {}", self.commits)?;
        writeln!(f, "[load] loaded:   {} rows", self.loaded_rows)?;
        writeln!(f, "[load] filtered: {} rows", self.filtered_rows)?;
        writeln!(f, "[load] bytes:    {}", self.loaded_bytes)?;
        writeln!(f, "[load] retries:  {}", self.retries)?;
        write!(
            f,
            "[load] failed:   {} commits ({} records dropped)",
            self.failed_commits, self.dropped_records
        )
    }
}

#[cfg(test)]
#[path = "summary_tests.rs"]
mod tests;
