//! Test doubles shared by the worker and processor tests.

use std::{
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use crossbeam::channel::Receiver;
use dorisload_client::{ClientError, Destination, LoadOptions, LoadResponse, Transport};

use crate::{
    listener::{CommitInfo, CommitListener},
    retry::RetryNotice,
};

#[derive(Debug, Clone)]
pub(crate) struct Committed {
    pub(crate) records: Vec<String>,
    pub(crate) label: Option<String>,
    pub(crate) table: String,
}

/// In-memory transport recording every successful commit.
#[derive(Default)]
pub(crate) struct MockTransport {
    commits: Mutex<Vec<Committed>>,
    attempts: AtomicUsize,
    /// Label sent with every attempt, failed ones included.
    attempt_labels: Mutex<Vec<Option<String>>>,
    remaining_failures: AtomicUsize,
    always_fail: bool,
    fail_code: u16,
    gate: Option<Receiver<()>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Answer the first `failures` attempts with HTTP `code`.
    pub(crate) fn failing_first(failures: usize, code: u16) -> Self {
        Self {
            remaining_failures: AtomicUsize::new(failures),
            fail_code: code,
            ..Self::default()
        }
    }

    pub(crate) fn always_failing(code: u16) -> Self {
        Self {
            always_fail: true,
            fail_code: code,
            ..Self::default()
        }
    }

    /// Block every attempt until a message arrives on `gate`.
    pub(crate) fn gated(gate: Receiver<()>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub(crate) fn commits(&self) -> Vec<Committed> {
        self.commits.lock().unwrap().clone()
    }

    pub(crate) fn committed_records(&self) -> Vec<String> {
        self.commits()
            .into_iter()
            .flat_map(|c| c.records)
            .collect()
    }

    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub(crate) fn attempt_labels(&self) -> Vec<Option<String>> {
        self.attempt_labels.lock().unwrap().clone()
    }

    fn failure(&self) -> ClientError {
        ClientError::Status {
            code: self.fail_code,
            body: "mock failure".into(),
        }
    }
}

impl Transport for MockTransport {
    fn commit(
        &self,
        payload: &[u8],
        destination: &Destination,
        options: &LoadOptions,
    ) -> Result<LoadResponse, ClientError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.attempt_labels
            .lock()
            .unwrap()
            .push(options.get_label().map(str::to_string));

        if let Some(gate) = &self.gate {
            let _ = gate.recv();
        }

        if self.always_fail {
            return Err(self.failure());
        }
        if self
            .remaining_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(self.failure());
        }

        let records: Vec<String> = String::from_utf8_lossy(payload)
            .lines()
            .map(str::to_string)
            .collect();
        let rows = records.len() as u64;
        let label = options.get_label().map(str::to_string);

        self.commits.lock().unwrap().push(Committed {
            records,
            label: label.clone(),
            table: destination.table.clone(),
        });

        Ok(LoadResponse {
            status: "Success".into(),
            label: label.unwrap_or_default(),
            number_total_rows: rows,
            number_loaded_rows: rows,
            load_bytes: payload.len() as u64,
            ..Default::default()
        })
    }
}

/// Listener keeping every notification for later assertions.
#[derive(Default)]
pub(crate) struct RecordingListener {
    pub(crate) commits: AtomicUsize,
    pub(crate) retries: Mutex<Vec<RetryNotice>>,
    /// `(worker, records, attempts)` per dropped batch.
    pub(crate) failures: Mutex<Vec<(usize, usize, u32)>>,
}

impl RecordingListener {
    pub(crate) fn retry_count(&self) -> usize {
        self.retries.lock().unwrap().len()
    }

    pub(crate) fn failures(&self) -> Vec<(usize, usize, u32)> {
        self.failures.lock().unwrap().clone()
    }
}

impl CommitListener for RecordingListener {
    fn on_commit(&self, _info: &CommitInfo<'_>, _response: &LoadResponse) {
        self.commits.fetch_add(1, Ordering::SeqCst);
    }

    fn on_retry(&self, _info: &CommitInfo<'_>, _error: &ClientError, notice: RetryNotice) {
        self.retries.lock().unwrap().push(notice);
    }

    fn on_failure(&self, info: &CommitInfo<'_>, _error: &ClientError, attempts: u32) {
        self.failures
            .lock()
            .unwrap()
            .push((info.worker, info.records, attempts));
    }
}

/// Poll `condition` until it holds or `timeout` passes.
pub(crate) fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}
